//! The web data-model specialization: `WebStateData` and the default
//! abilities that interpret it (§3, §4.5).

pub mod ability;
pub mod state;

pub use ability::{KeyboardAbility, MouseAbility, OmniAbility, VisionAbility};
pub use state::{ElementToExplore, WebStateData};
