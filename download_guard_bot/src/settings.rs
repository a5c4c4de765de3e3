//! Per-user preferences, and changing them with command arguments.

use serde::{Deserialize, Serialize};

use crate::{
    content_filter::{NsfwPolicy, Strictness},
    misc::host_of,
    url_detector::{AllowedTypes, AutoDownloadPolicy, UrlCategory},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub nsfw_filter: NsfwPolicy,
    pub auto_download: AutoDownloadPolicy,
}

pub const NSFW_FILTER_USAGE: &str = "Usage: <code>/nsfwfilter [on|off]</code>, \
    <code>strictness off|low|medium|high|strict</code>, \
    <code>warnings on|off</code>, <code>override on|off</code>, \
    <code>block on|off</code>, <code>autodelete on|off</code>, \
    <code>reports on|off</code>, <code>whitelist add|remove DOMAIN</code>";

pub const AUTO_DOWNLOAD_USAGE: &str = "Usage: <code>/autodownload [on|off]</code>, \
    <code>prompt on|off</code>, <code>types all|none|TYPE,TYPE...</code>, \
    <code>whitelist add|remove DOMAIN</code>, <code>blacklist add|remove DOMAIN</code>, \
    <code>leech on|off</code>, <code>extract on|off</code>, <code>compress on|off</code>";

fn parse_toggle(word: Option<&str>) -> Option<bool> {
    match word?.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "enable" => Some(true),
        "off" | "no" | "false" | "disable" => Some(false),
        _ => None,
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Normalize a domain someone typed, which may also be a whole URL.
fn normalize_domain(input: &str) -> Option<String> {
    let host = host_of(input);
    let host = host.strip_prefix("www.").unwrap_or(&host);
    (!host.is_empty()).then(|| host.to_owned())
}

/// Add or remove a domain in `list` according to `args`, which are
/// `add|remove DOMAIN`.
fn edit_domain_list(list: &mut Vec<String>, args: &[&str], name: &str) -> Result<String, String> {
    let (Some(action), Some(domain)) = (args.first(), args.get(1)) else {
        return Err(format!("Usage: <code>{name} add|remove DOMAIN</code>"));
    };

    let Some(domain) = normalize_domain(domain) else {
        return Err(format!(
            "<code>{}</code> doesn't look like a domain.",
            html_escape::encode_text(domain)
        ));
    };

    match action.to_ascii_lowercase().as_str() {
        "add" => {
            if list.contains(&domain) {
                return Ok(format!("<code>{domain}</code> is already in the {name}."));
            }
            list.push(domain.clone());
            Ok(format!("Added <code>{domain}</code> to the {name}."))
        }
        "remove" | "del" | "delete" => {
            let before = list.len();
            list.retain(|x| x != &domain);
            if list.len() == before {
                Ok(format!("<code>{domain}</code> wasn't in the {name}."))
            } else {
                Ok(format!("Removed <code>{domain}</code> from the {name}."))
            }
        }
        _ => Err(format!("Usage: <code>{name} add|remove DOMAIN</code>")),
    }
}

/// Change `policy` according to `/nsfwfilter` arguments.
///
/// # Errors
/// Returns an HTML message explaining what's wrong with the arguments.
pub fn apply_nsfw_args(policy: &mut NsfwPolicy, args: &[&str]) -> Result<String, String> {
    let Some(first) = args.first() else {
        return Err(NSFW_FILTER_USAGE.to_owned());
    };

    if let Some(value) = parse_toggle(Some(first)) {
        policy.enabled = value;
        return Ok(format!("NSFW filter is now {}.", on_off(value)));
    }

    let subject = first.to_ascii_lowercase();

    if subject == "strictness" || subject == "level" {
        let Some(level) = args.get(1).and_then(|x| x.parse::<Strictness>().ok()) else {
            return Err(
                "Strictness must be one of <code>off</code>, <code>low</code>, \
                <code>medium</code>, <code>high</code>, <code>strict</code>."
                    .to_owned(),
            );
        };
        policy.strictness = level;
        return Ok(format!("Strictness set to {}.", level.description()));
    }

    if subject == "whitelist" {
        return edit_domain_list(&mut policy.whitelist_domains, &args[1..], "whitelist");
    }

    let (field, name) = match subject.as_str() {
        "warnings" => (&mut policy.show_warnings, "Warnings"),
        "override" => (&mut policy.allow_override, "Overriding blocks"),
        "block" => (&mut policy.block_downloads, "Blocking downloads"),
        "autodelete" => (&mut policy.auto_delete_nsfw, "Deleting NSFW messages"),
        "reports" => (&mut policy.report_enabled, "Reporting"),
        _ => return Err(NSFW_FILTER_USAGE.to_owned()),
    };

    let Some(value) = parse_toggle(args.get(1).copied()) else {
        return Err(format!("Usage: <code>/nsfwfilter {subject} on|off</code>"));
    };
    *field = value;
    Ok(format!("{name} is now {}.", on_off(value)))
}

/// Parse a list of categories like `magnet, mega youtube`, or `all`, or `none`.
fn parse_allowed_types(args: &[&str]) -> Result<AllowedTypes, String> {
    let words: Vec<&str> = args
        .iter()
        .flat_map(|x| x.split(','))
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .collect();

    match words.as_slice() {
        [] => return Err(AUTO_DOWNLOAD_USAGE.to_owned()),
        [word] if word.eq_ignore_ascii_case("all") => return Ok(AllowedTypes::All),
        [word] if word.eq_ignore_ascii_case("none") => return Ok(AllowedTypes::Only(Vec::new())),
        _ => {}
    }

    let mut categories = Vec::new();
    for word in words {
        let Ok(category) = word.parse::<UrlCategory>() else {
            return Err(format!(
                "Unknown link type <code>{}</code>. Known types: {}",
                html_escape::encode_text(word),
                UrlCategory::ALL
                    .iter()
                    .filter(|x| !matches!(x, UrlCategory::Unknown | UrlCategory::Invalid))
                    .map(|x| format!("<code>{x}</code>"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        };
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    Ok(AllowedTypes::Only(categories))
}

/// Change `policy` according to `/autodownload` arguments.
///
/// # Errors
/// Returns an HTML message explaining what's wrong with the arguments.
pub fn apply_auto_download_args(
    policy: &mut AutoDownloadPolicy,
    args: &[&str],
) -> Result<String, String> {
    let Some(first) = args.first() else {
        return Err(AUTO_DOWNLOAD_USAGE.to_owned());
    };

    if let Some(value) = parse_toggle(Some(first)) {
        policy.enabled = value;
        return Ok(format!("Auto-download is now {}.", on_off(value)));
    }

    let subject = first.to_ascii_lowercase();

    match subject.as_str() {
        "types" => {
            policy.allowed_types = parse_allowed_types(&args[1..])?;
            return Ok(format!(
                "Auto-downloaded types: {}.",
                policy.allowed_types.describe()
            ));
        }
        "whitelist" => {
            return edit_domain_list(&mut policy.domain_whitelist, &args[1..], "whitelist")
        }
        "blacklist" => {
            return edit_domain_list(&mut policy.domain_blacklist, &args[1..], "blacklist")
        }
        _ => {}
    }

    let (field, name) = match subject.as_str() {
        "prompt" => (&mut policy.prompt_enabled, "Asking about links"),
        "leech" => (&mut policy.leech, "Leeching"),
        "extract" => (&mut policy.extract, "Extracting archives"),
        "compress" => (&mut policy.compress, "Compressing"),
        _ => return Err(AUTO_DOWNLOAD_USAGE.to_owned()),
    };

    let Some(value) = parse_toggle(args.get(1).copied()) else {
        return Err(format!("Usage: <code>/autodownload {subject} on|off</code>"));
    };
    *field = value;
    Ok(format!("{name} is now {}.", on_off(value)))
}

fn list_or_none(list: &[String]) -> String {
    if list.is_empty() {
        "none".to_owned()
    } else {
        list.join(", ")
    }
}

/// HTML overview of the content filter settings.
pub fn describe_nsfw(policy: &NsfwPolicy) -> String {
    format!(
        "<b>NSFW filter settings</b>\n\
        Filter: {}\n\
        Strictness: {}\n\
        Block downloads: {}\n\
        Warnings: {}\n\
        Override: {}\n\
        Reports: {}\n\
        Auto-delete: {}\n\
        Whitelist: {}",
        on_off(policy.enabled),
        policy.strictness.description(),
        on_off(policy.block_downloads),
        on_off(policy.show_warnings),
        on_off(policy.allow_override),
        on_off(policy.report_enabled),
        on_off(policy.auto_delete_nsfw),
        list_or_none(&policy.whitelist_domains),
    )
}

/// HTML overview of the auto-download settings.
pub fn describe_auto_download(policy: &AutoDownloadPolicy) -> String {
    format!(
        "<b>Auto-download settings</b>\n\
        Auto-download: {}\n\
        Ask about links: {}\n\
        Types: {}\n\
        Whitelist: {}\n\
        Blacklist: {}\n\
        Leech: {}\n\
        Extract: {}\n\
        Compress: {}",
        on_off(policy.enabled),
        on_off(policy.prompt_enabled),
        policy.allowed_types.describe(),
        list_or_none(&policy.domain_whitelist),
        list_or_none(&policy.domain_blacklist),
        on_off(policy.leech),
        on_off(policy.extract),
        on_off(policy.compress),
    )
}
