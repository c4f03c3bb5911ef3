pub(crate) mod assemble;
pub(crate) mod diagnostics;
pub(crate) mod engine;
pub(crate) mod validate;
