//! PID codec: canonical and legacy encodings of configuration identities.
//!
//! The canonical form is `factoryPid~name` for factory configurations and the
//! bare PID otherwise. Older installations produced two legacy shapes that
//! must still be understood:
//!
//! - an *alias* of the form `factoryPid.factoryPid.<generated>` alongside an
//!   old id of the form `factoryPid.name`;
//! - a bare old id of the form `factoryPid.factoryPid.name` with no alias.
//!
//! Both duplicate the factory PID, so the factory PID is recovered by splitting
//! the duplicated segment at its middle dot. This only works when the factory
//! PID has a dot layout that keeps the duplicated segment symmetric; other
//! inputs decode to something wrong or fail with
//! [`TypeError::AmbiguousLegacyId`]. That behavior is kept as-is.

use crate::error::TypeError;
use crate::identity::{ConfigurationIdentity, FACTORY_SEPARATOR};

/// Legacy separator between factory PID and name in resource file names.
pub const LEGACY_FACTORY_SEPARATOR: char = '-';

/// Record-file extensions stripped before an identity is derived.
pub const CONFIG_EXTENSIONS: [&str; 4] = [".config", ".properties", ".cfg", ".cfg.json"];

/// Extensions recognized in legacy extension mode.
pub const LEGACY_CONFIG_EXTENSIONS: [&str; 4] = [".cfg", ".config", ".xml", ".properties"];

/// Which set of file extensions [`remove_config_extension`] recognizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtensionMode {
    #[default]
    Standard,
    Legacy,
}

impl ExtensionMode {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            ExtensionMode::Standard => &CONFIG_EXTENSIONS,
            ExtensionMode::Legacy => &LEGACY_CONFIG_EXTENSIONS,
        }
    }
}

/// Canonical PID for `(factory_pid, name)`.
pub fn encode(factory_pid: Option<&str>, name: &str) -> String {
    match factory_pid {
        Some(factory_pid) => format!("{factory_pid}{FACTORY_SEPARATOR}{name}"),
        None => name.to_string(),
    }
}

/// Recover `(factory_pid, name)` from a legacy old id and optional alias.
///
/// Three shapes are handled:
///
/// 1. `alias` starts with `old_id`: the first `old_id.len() + 1` characters
///    of the alias are split at their middle dot to get the factory PID; the
///    name is the rest of the alias after that dot.
/// 2. `alias` diverges from `old_id`: walk back from the first differing
///    character to the preceding `.`; the factory PID is everything before it
///    and the name is `old_id` without the factory PID and dot.
/// 3. no alias: `old_id` is `factoryPid.factoryPid.name`; the name follows the
///    last dot and the rest is split at its middle dot.
pub fn decode_legacy_alias(
    alias: Option<&str>,
    old_id: &str,
) -> Result<ConfigurationIdentity, TypeError> {
    let fail = |reason: &str| TypeError::AmbiguousLegacyId {
        old_id: old_id.to_string(),
        alias: alias.map(str::to_string),
        reason: reason.to_string(),
    };

    match alias {
        Some(alias) if alias.starts_with(old_id) => {
            let segment = alias
                .get(..old_id.len() + 1)
                .ok_or_else(|| fail("alias is not longer than the old id"))?;
            let factory_pid =
                split_at_middle_dot(segment).ok_or_else(|| fail("no dot in factory segment"))?;
            let name = alias
                .get(factory_pid.len() + 1..)
                .ok_or_else(|| fail("alias ends at the factory PID"))?;
            Ok(ConfigurationIdentity::factory(factory_pid, name))
        }
        Some(alias) => {
            let a = alias.as_bytes();
            let o = old_id.as_bytes();
            let mut pos = 0;
            while pos < a.len() && pos < o.len() && a[pos] == o[pos] {
                pos += 1;
            }
            if pos == a.len() {
                return Err(fail("alias is a prefix of the old id"));
            }
            while pos > 0 && a[pos - 1] != b'.' {
                pos -= 1;
            }
            if pos == 0 {
                return Err(fail("no dot before the divergence point"));
            }
            let factory_pid = &alias[..pos - 1];
            let name = old_id
                .get(factory_pid.len() + 1..)
                .ok_or_else(|| fail("old id is shorter than the factory PID"))?;
            Ok(ConfigurationIdentity::factory(factory_pid, name))
        }
        None => {
            let (doubled, name) = old_id
                .rsplit_once('.')
                .ok_or_else(|| fail("old id has no dot"))?;
            let factory_pid =
                split_at_middle_dot(doubled).ok_or_else(|| fail("no dot in factory segment"))?;
            Ok(ConfigurationIdentity::factory(factory_pid, name))
        }
    }
}

/// Prefix of `segment` before its middle dot: of `n` dots, the one at
/// zero-based index `n / 2`.
fn split_at_middle_dot(segment: &str) -> Option<&str> {
    let dots: Vec<usize> = segment.match_indices('.').map(|(i, _)| i).collect();
    let middle = *dots.get(dots.len() / 2)?;
    Some(&segment[..middle])
}

/// Strip a known record-file extension from `name`.
pub fn remove_config_extension(name: &str, mode: ExtensionMode) -> &str {
    mode.extensions()
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name)
}

/// Split a PID derived from a resource path into factory PID and name.
///
/// Splits on the first `~`, or failing that on the first `-`. A separator at
/// position zero does not split.
pub fn split_factory_and_name(pid: &str) -> ConfigurationIdentity {
    let pos = pid
        .find(FACTORY_SEPARATOR)
        .or_else(|| pid.find(LEGACY_FACTORY_SEPARATOR));
    match pos {
        Some(n) if n > 0 => ConfigurationIdentity::factory(&pid[..n], &pid[n + 1..]),
        _ => ConfigurationIdentity::singleton(pid),
    }
}

/// Last segment of a resource URL.
///
/// Backslashes count as path separators. Without any `/` the part after the
/// first `:` is used, and without that the whole URL.
pub fn resource_id(url: &str) -> String {
    let url = url.replace('\\', "/");
    let pos = url.rfind('/').or_else(|| url.find(':'));
    match pos {
        Some(pos) => url[pos + 1..].to_string(),
        None => url,
    }
}

/// PID reported upward for a store change notification.
///
/// Old-style factory PIDs of the form `factoryPid.name` are reported in
/// canonical form so they group with the resource that produced them.
pub fn event_pid(pid: &str, factory_pid: Option<&str>) -> String {
    if let Some(factory_pid) = factory_pid {
        if let Some(rest) = pid
            .strip_prefix(factory_pid)
            .and_then(|rest| rest.strip_prefix('.'))
        {
            return encode(Some(factory_pid), rest);
        }
    }
    pid.to_string()
}
