//! Native bundles: shared libraries loaded with `libloading`

pub(crate) mod api;
pub(crate) mod native;
