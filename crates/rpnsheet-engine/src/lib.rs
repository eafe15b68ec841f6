//! rpnsheet_engine - Cell references, dependency ordering and postfix arithmetic.

pub mod engine;
