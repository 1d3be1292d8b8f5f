pub mod authority;
pub mod fix;
pub mod imgclg;
pub mod names;
pub mod save;
pub mod submit;

pub use authority::{Grtobjaut, Rvkobjaut};
pub use fix::Sndptford;
pub use imgclg::{Chgnfsexp, Crtdevopt, Crtimgclg, Dltdevd, Dltimgclg, Lodimgclg, Strnfssvr, Vrycfg};
pub use save::{Clrsavf, Crtsavf, Rstobj, Savobj};
pub use submit::Sbmjob;

/// Collapse runs of whitespace to single spaces and trim the ends, so a
/// builder with empty optional tails renders without stray padding.
pub(crate) fn collapse_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
