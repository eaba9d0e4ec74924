//! User-model factory (§4.5, §4.12 `BUILD_USER`/`CRAWL_USERS`).
//!
//! `CrawlConfig` only carries user names; this module is the CLI's own
//! table mapping a name to the concrete `UserAbility` bundle it stands
//! for, mirroring the original's `mode_web` user definitions.

use demodocus_core::ability::UserModel;
use demodocus_core::web::{KeyboardAbility, MouseAbility, OmniAbility, VisionAbility};
use std::sync::Arc;
use tracing::warn;

/// Build the all-capable user used to discover the full graph. Ignores
/// `name` beyond using it as the returned model's identity, so a config
/// can call its build user whatever it likes.
pub fn build_user(name: &str) -> UserModel {
    UserModel::new(name, vec![Arc::new(OmniAbility)])
}

/// Resolve one crawl-user name to a `UserModel`. Recognizes a small,
/// fixed set of ability bundles; an unrecognized name still gets a
/// `UserModel` back (with `mouse`+`keyboard`+`vision` abilities, the union
/// any named-but-unknown profile most plausibly means) with a warning, so
/// a typo in `crawl_users` degrades gracefully instead of failing the
/// crawl outright — `CrawlConfig::validate` already guarantees the list
/// is non-empty, not that every name is recognized.
pub fn crawl_user(name: &str) -> UserModel {
    match name {
        "mouse_only" | "mouse" => UserModel::new(name, vec![Arc::new(MouseAbility)]),
        "keyboard_only" | "keyboard" => UserModel::new(name, vec![Arc::new(KeyboardAbility)]),
        "screenreader" | "sighted_keyboard" => {
            UserModel::new(name, vec![Arc::new(KeyboardAbility), Arc::new(VisionAbility)])
        }
        "low_vision" | "vision" => UserModel::new(name, vec![Arc::new(MouseAbility), Arc::new(VisionAbility)]),
        _ => {
            warn!(user = name, "unrecognized crawl user name; falling back to mouse+keyboard+vision");
            UserModel::new(
                name,
                vec![Arc::new(MouseAbility), Arc::new(KeyboardAbility), Arc::new(VisionAbility)],
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_claim_the_right_actions() {
        let keyboard = crawl_user("keyboard_only");
        assert!(keyboard.claims_action("key_press:tab"));
        assert!(!keyboard.claims_action("mouse_click"));
    }

    #[test]
    fn unknown_name_falls_back_to_every_ability() {
        let user = crawl_user("totally-unknown");
        assert!(user.claims_action("mouse_click"));
        assert!(user.claims_action("key_press:tab"));
    }
}
