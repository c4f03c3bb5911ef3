pub(crate) mod overrides;
pub(crate) mod resolver;
pub(crate) mod view;
