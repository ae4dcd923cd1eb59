/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Minimal BCP-47 language tag parsing: `language[-Script][-REGION|-NNN]`.
//! Script and region subtags match in any case and come back in their
//! canonical form (`Hant`, `KR`), since they name resource directories.

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bcp47 {
    language: String,
    script: Option<String>,
    region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLanguageTag(pub String);

impl std::fmt::Display for InvalidLanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid BCP-47 language tag '{}'", self.0)
    }
}

impl std::error::Error for InvalidLanguageTag {}

impl Bcp47 {
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl FromStr for Bcp47 {
    type Err = InvalidLanguageTag;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidLanguageTag(tag.to_string());
        let mut parts = tag.split('-');

        let language = parts.next().filter(|l| is_language(l)).ok_or_else(invalid)?;
        let mut script = None;
        let mut region = None;

        let mut next = parts.next();
        if let Some(part) = next
            && is_script(part)
        {
            script = Some(title_case(part));
            next = parts.next();
        }
        if let Some(part) = next {
            if !is_region(part) {
                return Err(invalid());
            }
            region = Some(part.to_ascii_uppercase());
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            language: language.to_string(),
            script,
            region,
        })
    }
}

fn is_language(part: &str) -> bool {
    (2..=3).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_script(part: &str) -> bool {
    part.len() == 4 && part.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_region(part: &str) -> bool {
    (part.len() == 2 && part.bytes().all(|b| b.is_ascii_alphabetic()))
        || (part.len() == 3 && part.bytes().all(|b| b.is_ascii_digit()))
}

fn title_case(part: &str) -> String {
    let mut out = part.to_ascii_lowercase();
    if let Some(first) = out.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    out
}
