pub(crate) mod ease;
pub(crate) mod render;
pub(crate) mod track;
