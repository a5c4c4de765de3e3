use std::{future::Future, pin::Pin};

use bot_commons::useful_methods::*;
use html_escape::encode_text;
use teloxide::{
    types::{BotCommand, Me, Message, UserId},
    Bot, RequestError,
};

use super::BotState;
use crate::{
    content_filter::{decide, lists},
    guard::{scan_summary, ReportKind},
    misc::is_web_url,
    settings::{
        apply_auto_download_args, apply_nsfw_args, describe_auto_download, describe_nsfw,
        AUTO_DOWNLOAD_USAGE, NSFW_FILTER_USAGE,
    },
};

pub const COMMANDS: &[Command] = &[
    START,
    HELP,
    NSFWTEST,
    NSFWSTATS,
    REPORTFP,
    REPORTMISSED,
    NSFWFILTER,
    AUTODOWNLOAD,
    URLINFO,
];

pub type Ret = Result<(), RequestError>;
pub type CommandFuture<'a> = Pin<Box<dyn Future<Output = Ret> + Send + 'a>>;

pub struct CommandParams<'a> {
    pub state: &'a BotState,
    pub bot: &'a Bot,
    pub message: &'a Message,
    pub message_text: &'a str,
    pub command_len: usize,
}

impl<'a> CommandParams<'a> {
    pub fn new<'new>(
        state: &'new BotState,
        bot: &'new Bot,
        message: &'new Message,
    ) -> Option<CommandParams<'new>> {
        let message_text = message.text_full()?;

        if !message_text.starts_with('/') {
            return None;
        }

        let command = message_text.split_whitespace().next()?;

        if !command.is_ascii() {
            // Telegram commands are ASCII only.
            return None;
        }

        Some(CommandParams {
            state,
            bot,
            message,
            message_text,
            command_len: command.len(),
        })
    }

    /// Find the command this message calls and start running it.
    /// Returns [`None`] if it isn't one of ours.
    pub fn run(self, bot_me: &Me) -> Option<CommandFuture<'a>> {
        // "/nsfwtest@Some_Bot" is for us only if we are Some_Bot.
        let callname = if let Some(username_start) = self.command().find('@') {
            if !self.command()[username_start + '@'.len_utf8()..]
                .eq_ignore_ascii_case(bot_me.username())
            {
                return None;
            }

            &self.command()[..username_start]
        } else {
            self.command()
        };

        COMMANDS
            .iter()
            .find(|x| x.is_matching_callname(callname))
            .map(|command| (command.function)(self))
    }

    /// If the message is `/urlinfo https://example.com`, this is `/urlinfo`.
    #[inline]
    pub fn command(&self) -> &'a str {
        &self.message_text[..self.command_len]
    }

    /// If the message is `/urlinfo https://example.com`, this is `https://example.com`.
    #[inline]
    pub fn get_params(&self) -> &'a str {
        self.message_text[self.command_len..].trim()
    }

    fn sender(&self) -> Option<UserId> {
        self.message.sender_user_id()
    }

    async fn respond(&self, text: impl Into<String>) -> Ret {
        self.bot.reply_html(self.message, text.into(), None).await?;
        Ok(())
    }
}

pub struct Command {
    pub callname: &'static str,
    pub description: &'static str,
    pub function: fn(CommandParams) -> CommandFuture,
    hidden: bool,
}

impl Command {
    pub fn is_matching_callname(&self, command: &str) -> bool {
        self.callname
            .split_ascii_whitespace()
            .next()
            .is_some_and(|x| x.eq_ignore_ascii_case(command))
    }

    pub fn generate_help() -> String {
        let mut response = String::from("<b>Commands:</b>\n\n");
        for command in COMMANDS.iter().filter(|x| !x.hidden) {
            response.push_str(&encode_text(command.callname));
            response.push_str(" - ");
            response.push_str(command.description);
            response.push_str("\n\n");
        }
        response.truncate(response.trim_end().len());
        response
    }

    pub fn generate_bot_commands() -> Vec<BotCommand> {
        COMMANDS
            .iter()
            .filter(|x| !x.hidden)
            .filter_map(|command| {
                let callname = command.callname.split_ascii_whitespace().next()?;
                Some(BotCommand {
                    // Cut off the /
                    command: callname[1..].to_string(),
                    description: command.description.to_string(),
                })
            })
            .collect()
    }
}

///////////////////////////////////////
/////////////////COMMAND DEFINITIONS
///////////////////////////////////////

/// Wraps the function's return value in a pinning closure.
macro_rules! wrap {
    ($thing:expr) => {
        |cp| Box::pin($thing(cp))
    };
}

/// Reply with the text and stop.
macro_rules! goodbye {
    ($cp:expr, $text:expr) => {
        return $cp.respond($text).await
    };
}

/// Get the ID of the user that sent the command, or tell anonymous senders off.
macro_rules! sender_or_goodbye {
    ($cp:expr) => {
        match $cp.sender() {
            Some(x) => x,
            None => goodbye!($cp, "This command needs to be sent from a user account."),
        }
    };
}

pub const START: Command = Command {
    callname: "/start",
    description: "",
    function: wrap!(start),
    hidden: true,
};
async fn start(cp: CommandParams<'_>) -> Ret {
    if !cp.message.chat.is_private() {
        return Ok(());
    }

    let text = format!(
        "Hi! I keep an eye on links sent to the download bot.\n\n\
        Links that look like adult content get blocked or flagged according to \
        your /nsfwfilter settings, and links I know how to download get sent \
        for downloading according to your /autodownload settings.\n\n{}",
        Command::generate_help()
    );
    goodbye!(cp, text);
}

pub const HELP: Command = Command {
    callname: "/help",
    description: "Show this list.",
    function: wrap!(help),
    hidden: false,
};
async fn help(cp: CommandParams<'_>) -> Ret {
    goodbye!(cp, Command::generate_help());
}

pub const NSFWTEST: Command = Command {
    callname: "/nsfwtest <url>",
    description: "Check what the NSFW filter thinks of a link.",
    function: wrap!(nsfwtest),
    hidden: false,
};
async fn nsfwtest(cp: CommandParams<'_>) -> Ret {
    let url = cp.get_params();
    if url.is_empty() {
        goodbye!(cp, "Usage: <code>/nsfwtest URL</code>");
    }

    let scan = cp.state.filter.scan(url, "", "");

    let blocked_for_user = match cp.sender() {
        Some(user) => {
            let settings = cp
                .state
                .database
                .get_settings(user)
                .await
                .expect("Database died!");
            decide(Some(&settings.nsfw_filter), &scan)
        }
        None => decide(None, &scan),
    };

    let text = format!(
        "🔍 <b>NSFW Filter Test</b>\n\n<b>URL:</b> <code>{}</code>\n{}",
        encode_text(url),
        scan_summary(&scan, blocked_for_user)
    );
    goodbye!(cp, text);
}

pub const NSFWSTATS: Command = Command {
    callname: "/nsfwstats",
    description: "Show how much the NSFW filter and auto-download have been doing.",
    function: wrap!(nsfwstats),
    hidden: false,
};
async fn nsfwstats(cp: CommandParams<'_>) -> Ret {
    let filter = cp.state.filter.stats();
    let downloads = cp.state.stats.snapshot();

    let stored_false_positives = cp
        .state
        .database
        .count_reports(ReportKind::FalsePositive)
        .await
        .expect("Database died!");
    let stored_missed = cp
        .state
        .database
        .count_reports(ReportKind::Missed)
        .await
        .expect("Database died!");

    let text = format!(
        "📊 <b>NSFW Filter Statistics</b>\n\n\
        • Total scanned: {}\n\
        • NSFW blocked: {} ({:.1}%)\n\
        • False positives: {} ({:.1}%)\n\
        • User reports: {}\n\
        • Reports on record: {} false positives, {} missed\n\n\
        <b>Reference lists</b>\n\
        • NSFW domains: {}\n\
        • Safe domains: {}\n\
        • Keywords: {}\n\n\
        <b>Cache</b>\n\
        • Entries: {}\n\
        • Hits: {}\n\
        • Misses: {}\n\n\
        🤖 <b>Auto-Download</b>\n\
        • Links detected: {}\n\
        • Downloaded: {}\n\
        • Prompted: {}\n\
        • Failed: {}",
        filter.total_scanned,
        filter.nsfw_blocked,
        filter.blocked_percent(),
        filter.false_positives,
        filter.false_positive_percent(),
        filter.user_reports,
        stored_false_positives,
        stored_missed,
        lists::NSFW_DOMAINS.len() + lists::NSFW_HOST_PATHS.len(),
        lists::SAFE_DOMAINS.len(),
        lists::NSFW_KEYWORDS.len(),
        cp.state.filter.cache_len(),
        filter.cache_hits,
        filter.cache_misses,
        downloads.total_detected,
        downloads.auto_downloaded,
        downloads.user_prompted,
        downloads.failed,
    );
    goodbye!(cp, text);
}

pub const REPORTFP: Command = Command {
    callname: "/reportfp <url>",
    description: "Report a link that was flagged but is safe.",
    function: wrap!(reportfp),
    hidden: false,
};
async fn reportfp(cp: CommandParams<'_>) -> Ret {
    report(cp, ReportKind::FalsePositive).await
}

pub const REPORTMISSED: Command = Command {
    callname: "/reportmissed <url>",
    description: "Report an adult content link that wasn't flagged.",
    function: wrap!(reportmissed),
    hidden: false,
};
async fn reportmissed(cp: CommandParams<'_>) -> Ret {
    report(cp, ReportKind::Missed).await
}

async fn report(cp: CommandParams<'_>, kind: ReportKind) -> Ret {
    let user = sender_or_goodbye!(cp);

    let url = cp.get_params();
    if !is_web_url(url) {
        goodbye!(
            cp,
            format!(
                "Usage: <code>{} URL</code>, where the URL starts with <code>http://</code> \
                or <code>https://</code>",
                encode_text(cp.command())
            )
        );
    }

    let settings = cp
        .state
        .database
        .get_settings(user)
        .await
        .expect("Database died!");

    if !settings.nsfw_filter.report_enabled {
        goodbye!(
            cp,
            "Reporting is disabled. Enable it with <code>/nsfwfilter reports on</code>."
        );
    }

    let scan = cp.state.filter.scan(url, "", "");
    let blocked = decide(Some(&settings.nsfw_filter), &scan);

    let title = match kind {
        ReportKind::FalsePositive => {
            cp.state.filter.report_false_positive(url, user.0);
            "📝 <b>False Positive Reported</b>"
        }
        ReportKind::Missed => {
            cp.state.filter.report_missed(url, user.0);
            "📝 <b>Missed NSFW Content Reported</b>"
        }
    };

    cp.state
        .database
        .add_report(user, url, kind)
        .await
        .expect("Database died!");

    let text = format!(
        "{title}\n\n<b>URL:</b> <code>{}</code>\n{}\n\n<i>Thanks! Reports help improve the filter.</i>",
        encode_text(url),
        scan_summary(&scan, blocked)
    );
    goodbye!(cp, text);
}

pub const NSFWFILTER: Command = Command {
    callname: "/nsfwfilter [setting value]",
    description: "Show or change your NSFW filter settings.",
    function: wrap!(nsfwfilter),
    hidden: false,
};
async fn nsfwfilter(cp: CommandParams<'_>) -> Ret {
    let user = sender_or_goodbye!(cp);

    let mut settings = cp
        .state
        .database
        .get_settings(user)
        .await
        .expect("Database died!");

    let args: Vec<&str> = cp.get_params().split_whitespace().collect();
    if args.is_empty() {
        goodbye!(
            cp,
            format!(
                "{}\n\n{NSFW_FILTER_USAGE}",
                describe_nsfw(&settings.nsfw_filter)
            )
        );
    }

    let response = match apply_nsfw_args(&mut settings.nsfw_filter, &args) {
        Ok(x) => x,
        Err(e) => goodbye!(cp, e),
    };

    cp.state
        .database
        .save_settings(user, &settings)
        .await
        .expect("Database died!");

    log::debug!("User {user} changed NSFW filter settings: {args:?}");
    goodbye!(cp, response);
}

pub const AUTODOWNLOAD: Command = Command {
    callname: "/autodownload [setting value]",
    description: "Show or change which links get downloaded automatically.",
    function: wrap!(autodownload),
    hidden: false,
};
async fn autodownload(cp: CommandParams<'_>) -> Ret {
    let user = sender_or_goodbye!(cp);

    let mut settings = cp
        .state
        .database
        .get_settings(user)
        .await
        .expect("Database died!");

    let args: Vec<&str> = cp.get_params().split_whitespace().collect();
    if args.is_empty() {
        goodbye!(
            cp,
            format!(
                "{}\n\n{AUTO_DOWNLOAD_USAGE}",
                describe_auto_download(&settings.auto_download)
            )
        );
    }

    let response = match apply_auto_download_args(&mut settings.auto_download, &args) {
        Ok(x) => x,
        Err(e) => goodbye!(cp, e),
    };

    cp.state
        .database
        .save_settings(user, &settings)
        .await
        .expect("Database died!");

    log::debug!("User {user} changed auto-download settings: {args:?}");
    goodbye!(cp, response);
}

pub const URLINFO: Command = Command {
    callname: "/urlinfo <url>",
    description: "Show what kind of link this is and how it would be downloaded.",
    function: wrap!(urlinfo),
    hidden: false,
};
async fn urlinfo(cp: CommandParams<'_>) -> Ret {
    let url = cp.get_params();
    if url.is_empty() {
        goodbye!(cp, "Usage: <code>/urlinfo URL</code>");
    }

    let info = cp.state.detector.url_info(url);
    let yes_no = |x: bool| if x { "yes" } else { "no" };
    let domain = match info.metadata.domain.as_str() {
        "" => "none",
        x => x,
    };

    let text = format!(
        "🔗 <b>URL Info</b>\n\n\
        <b>URL:</b> <code>{}</code>\n\
        <b>Category:</b> <code>{}</code>\n\
        <b>Type:</b> <code>{}</code>\n\
        <b>Domain:</b> <code>{}</code>\n\
        <b>Downloadable:</b> {}\n\
        <b>Needs login:</b> {}\n\
        <b>Multiple files:</b> {}\n\
        <b>Priority:</b> {}/100",
        encode_text(url),
        info.category,
        info.metadata.estimated_type,
        encode_text(domain),
        yes_no(info.metadata.downloadable),
        yes_no(info.metadata.requires_auth),
        yes_no(info.metadata.supports_batch),
        info.priority,
    );
    goodbye!(cp, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_commands() {
        let commands = Command::generate_bot_commands();
        let names: Vec<&str> = commands.iter().map(|x| x.command.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "help",
                "nsfwtest",
                "nsfwstats",
                "reportfp",
                "reportmissed",
                "nsfwfilter",
                "autodownload",
                "urlinfo"
            ]
        );
        assert!(commands.iter().all(|x| !x.description.is_empty()));
    }

    #[test]
    fn callnames() {
        assert!(NSFWTEST.is_matching_callname("/NSFWtest"));
        assert!(!NSFWTEST.is_matching_callname("/nsfwtes"));
        assert!(!NSFWTEST.is_matching_callname("/nsfwtest <url>"));
    }

    #[test]
    fn help_lists_visible_commands() {
        let help = Command::generate_help();
        assert!(help.contains("/urlinfo &lt;url&gt; - Show what kind of link"));
        assert!(!help.contains("/start"));
        assert!(!help.ends_with('\n'));
    }
}
