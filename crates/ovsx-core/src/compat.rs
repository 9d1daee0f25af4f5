//! Engine-compatibility selection over query results.
//!
//! Consumed by layers above the router (e.g. an installer deciding which
//! version to fetch); the router itself never consults compatibility.

use ovsx_schema::ExtensionRaw;
use semver::{Version, VersionReq};

/// Engine whose declared requirement gates compatibility.
pub const VSCODE_ENGINE: &str = "vscode";

/// The version range an extension record declares for the gating engine,
/// if it declares one and it parses.
pub fn engine_requirement(extension: &ExtensionRaw) -> Option<VersionReq> {
    extension
        .engines
        .as_ref()?
        .get(VSCODE_ENGINE)
        .and_then(|raw| VersionReq::parse(raw).ok())
}

/// Whether the record can run on the given engine version.
///
/// A record declaring no (parseable) requirement is considered compatible;
/// registries predate engine metadata and plenty of published versions
/// omit it.
pub fn is_compatible(extension: &ExtensionRaw, engine: &Version) -> bool {
    match engine_requirement(extension) {
        Some(requirement) => requirement.matches(engine),
        None => true,
    }
}

/// Pick the newest record compatible with the given engine version.
///
/// Intended for `query` results fetched with `includeAllVersions`, where
/// the registry returns one record per published version. Versions that
/// parse as semver rank above ones that do not; non-semver versions fall
/// back to lexical comparison.
pub fn latest_compatible<'a>(
    extensions: &'a [ExtensionRaw],
    engine: &Version,
) -> Option<&'a ExtensionRaw> {
    let mut best: Option<&ExtensionRaw> = None;
    for extension in extensions {
        if !is_compatible(extension, engine) {
            continue;
        }
        match best {
            Some(current) if !is_newer(&extension.version, &current.version) => {}
            _ => best = Some(extension),
        }
    }
    best
}

/// `true` if version `a` ranks above version `b`.
fn is_newer(a: &str, b: &str) -> bool {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => a > b,
        (Ok(_), Err(_)) => true,
        (Err(_), Ok(_)) => false,
        (Err(_), Err(_)) => a > b,
    }
}
