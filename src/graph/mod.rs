pub(crate) mod cache;
pub(crate) mod fingerprint;
pub(crate) mod index;
pub(crate) mod model;
pub(crate) mod node;
pub(crate) mod ports;
