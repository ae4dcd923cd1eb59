/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use proptest::prelude::*;
use rstest::rstest;
use webappmanager::ApplicationDescription;

fn parse(json: &str) -> ApplicationDescription {
    ApplicationDescription::from_json(json).expect("manifest should parse")
}

#[rstest]
#[case(r#"{"id":"a"}"#, "default")]
#[case(r#"{"id":"a","trustLevel":"invalid-value"}"#, "default")]
#[case(r#"{"id":"a","trustLevel":"trusted"}"#, "trusted")]
#[case(r#"{"id":"a","trustLevel":"default"}"#, "default")]
fn trust_level_defaults(#[case] json: &str, #[case] expected: &str) {
    assert_eq!(parse(json).trust_level(), expected);
}

#[rstest]
#[case("800x600", 800, 600)]
#[case("-1x600", 0, 0)]
#[case("800x0", 0, 0)]
#[case("800x600x2", 0, 0)]
#[case("wide", 0, 0)]
fn resolution_override(#[case] resolution: &str, #[case] width: i32, #[case] height: i32) {
    let desc = parse(&format!(r#"{{"id":"a","resolution":"{resolution}"}}"#));
    assert_eq!((desc.width_override(), desc.height_override()), (width, height));
}

#[rstest]
#[case(r#"{"id":"a"}"#, true)]
#[case(r#"{"id":"a","disallowScrollingInMainFrame":false}"#, false)]
#[case(r#"{"id":"a","disallowScrollingInMainFrame":true}"#, true)]
fn scrolling_is_disallowed_unless_enabled(#[case] json: &str, #[case] disallowed: bool) {
    assert_eq!(parse(json).disallow_scrolling_in_main_frame(), disallowed);
}

#[test]
fn non_object_manifests_are_rejected() {
    assert!(ApplicationDescription::from_json("[]").is_none());
    assert!(ApplicationDescription::from_json("{\"id\":").is_none());
}

proptest! {
    #[test]
    fn unknown_trust_levels_fall_back_to_default(level in "[a-z-]{0,16}") {
        prop_assume!(level != "trusted");
        let desc = parse(&format!(r#"{{"id":"a","trustLevel":"{level}"}}"#));
        prop_assert_eq!(desc.trust_level(), "default");
    }

    #[test]
    fn positive_resolutions_are_kept(width in 1i32..8192, height in 1i32..8192) {
        let desc = parse(&format!(r#"{{"id":"a","resolution":"{width}x{height}"}}"#));
        prop_assert_eq!(desc.resolution_override(), Some((width as u32, height as u32)));
    }
}
