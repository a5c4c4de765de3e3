//! Reference lists the content filter checks against. These only change with a
//! new build of the bot.

/// Hosts known to serve adult content. Subdomains of these are flagged too.
pub static NSFW_DOMAINS: &[&str] = &[
    // Tube sites
    "pornhub.com",
    "xvideos.com",
    "xnxx.com",
    "redtube.com",
    "youporn.com",
    "tube8.com",
    "spankbang.com",
    "xhamster.com",
    "beeg.com",
    "porn.com",
    "sex.com",
    "xxx.com",
    "adult.com",
    "brazzers.com",
    "realitykings.com",
    "bangbros.com",
    "naughtyamerica.com",
    "digitalplayground.com",
    "vivid.com",
    "eporner.com",
    "tnaflix.com",
    "drtuber.com",
    "sunporno.com",
    "nuvid.com",
    "porntube.com",
    "xtube.com",
    "slutload.com",
    "empflix.com",
    "keezmovies.com",
    "pornoxo.com",
    "fapdu.com",
    "zbporn.com",
    "upornia.com",
    "porndig.com",
    "yespornplease.com",
    "porntrex.com",
    "hqporner.com",
    "pornone.com",
    "sexvid.xxx",
    // Creator platforms
    "onlyfans.com",
    "fansly.com",
    "justforfans.com",
    "loyalfans.com",
    "manyvideos.com",
    "clips4sale.com",
    "iwantclips.com",
    "adultwork.com",
    // Cams
    "streamate.com",
    "chaturbate.com",
    "cam4.com",
    "livejasmin.com",
    "bongacams.com",
    "myfreecams.com",
    "camsoda.com",
    "stripchat.com",
    "xlovecam.com",
    "flirt4free.com",
    "imlive.com",
    // Trackers and forums
    "pornbb.org",
    "empornium.me",
    "empornium.sx",
    "empornium.is",
    "pornolab.net",
    "cheggit.me",
    "pornleech.com",
    "adultdvdtalk.com",
    "vintage-erotica-forum.com",
    "pornbay.org",
    "sexuria.org",
    "oppaitime.com",
    // Image hosts
    "imagefap.com",
    "motherless.com",
    "heavy-r.com",
    "erome.com",
    "sexiezpix.com",
    "nude-gals.com",
    // Hentai and boorus
    "nhentai.net",
    "hanime.tv",
    "hentaihaven.org",
    "fakku.net",
    "tsumino.com",
    "hitomi.la",
    "e-hentai.org",
    "exhentai.org",
    "gelbooru.com",
    "rule34.xxx",
    "danbooru.donmai.us",
    // Games
    "f95zone.to",
    "lewdgames.net",
    "adultgameson.com",
    "nutaku.net",
    "kimochi.info",
    "vndb.org",
    // Dating
    "tinder.com",
    "adultfriendfinder.com",
    "ashley-madison.com",
    "seeking.com",
    "benaughty.com",
    "flirt.com",
    // Shops
    "adameve.com",
    "lovehoney.com",
    "spencers.com",
    "pinkcherry.com",
    "extremerestraints.com",
    // Social
    "fetlife.com",
    "adultspace.com",
    "sexsearch.com",
    "alt.com",
    "kink.com",
];

/// Sections of otherwise fine sites, as `host/path-prefix`.
pub static NSFW_HOST_PATHS: &[&str] = &[
    "reddit.com/r/nsfw",
    "reddit.com/r/porn",
    "reddit.com/r/sex",
    "reddit.com/r/gonewild",
    "reddit.com/r/realgirls",
    "4chan.org/b/",
    "4chan.org/s/",
    "4chan.org/hc/",
];

/// Hosts that are fine to download from. Flags on these are dampened, not dropped.
pub static SAFE_DOMAINS: &[&str] = &[
    // Platforms
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "twitch.tv",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "tiktok.com",
    "linkedin.com",
    "pinterest.com",
    "snapchat.com",
    // Cloud storage
    "drive.google.com",
    "docs.google.com",
    "dropbox.com",
    "onedrive.live.com",
    "box.com",
    "pcloud.com",
    "mega.nz",
    "mega.co.nz",
    "mediafire.com",
    // Code and archives
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "sourceforge.net",
    "archive.org",
    "internet-archive.org",
    // Education and news
    "wikipedia.org",
    "britannica.com",
    "coursera.org",
    "edx.org",
    "khanacademy.org",
    "ted.com",
    "bbc.com",
    "cnn.com",
    "reuters.com",
    "ap.org",
    // Entertainment
    "netflix.com",
    "disney.com",
    "hulu.com",
    "amazon.com",
    "spotify.com",
    "soundcloud.com",
    "bandcamp.com",
    // Tech
    "stackoverflow.com",
    "stackexchange.com",
    "reddit.com",
    "discord.com",
    "slack.com",
    "zoom.us",
    "teams.microsoft.com",
];

/// Words and phrases that hint at adult content. Matched case-insensitively
/// as whole words.
pub static NSFW_KEYWORDS: &[&str] = &[
    // Explicit
    "porn",
    "sex",
    "xxx",
    "adult",
    "nude",
    "naked",
    "nsfw",
    "erotic",
    "sexy",
    "horny",
    "kinky",
    "fetish",
    "bdsm",
    // Anatomy
    "boobs",
    "tits",
    "ass",
    "pussy",
    "dick",
    "cock",
    "penis",
    "vagina",
    "breast",
    "nipple",
    "genital",
    // Acts
    "masturbat",
    "orgasm",
    "climax",
    "ejaculat",
    "cumshot",
    "blowjob",
    "handjob",
    "footjob",
    "rimjob",
    "anal",
    "oral",
    "threesome",
    "gangbang",
    "orgy",
    "swingers",
    // Genres
    "milf",
    "teen",
    "mature",
    "amateur",
    "professional",
    "lesbian",
    "gay",
    "bisexual",
    "transgender",
    "shemale",
    "bbw",
    "ebony",
    "asian",
    "latina",
    "redhead",
    "blonde",
    // Site names
    "onlyfans",
    "pornhub",
    "xvideos",
    "chaturbate",
    "cam4",
    "livejasmin",
    "streamate",
    "myfreecams",
    "camsoda",
    // File names
    "nude.jpg",
    "sex.mp4",
    "porn.avi",
    "xxx.mkv",
    // Labels
    "18+",
    "21+",
    "adults only",
    "mature content",
    "explicit",
    "uncensored",
    "hardcore",
    "softcore",
    "erotica",
    // Anime
    "hentai",
    "ecchi",
    "doujin",
    "ahegao",
    "oppai",
    "loli",
    "shota",
    "futanari",
    "yaoi",
    "yuri",
    "netorare",
    "ntr",
];

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn is_plain_host(entry: &str) -> bool {
        !entry.is_empty()
            && !entry.contains('/')
            && entry == entry.to_lowercase()
            && !entry.starts_with("www.")
    }

    #[test]
    fn lists_are_lowercase_hosts() {
        for entry in NSFW_DOMAINS.iter().chain(SAFE_DOMAINS) {
            assert!(is_plain_host(entry), "Bad host entry: {entry}");
        }
        for entry in NSFW_HOST_PATHS {
            let (host, path) = entry.split_once('/').unwrap();
            assert!(is_plain_host(host), "Bad host in {entry}");
            assert!(!path.is_empty(), "Empty path in {entry}");
        }
    }

    #[test]
    fn no_duplicates_or_overlap() {
        let mut seen = std::collections::HashSet::new();
        for entry in NSFW_DOMAINS {
            assert!(seen.insert(*entry), "Duplicate: {entry}");
            assert!(!SAFE_DOMAINS.contains(entry), "Both safe and NSFW: {entry}");
        }
        let mut seen = std::collections::HashSet::new();
        for entry in NSFW_KEYWORDS {
            assert!(seen.insert(*entry), "Duplicate keyword: {entry}");
            assert_eq!(*entry, entry.to_lowercase());
        }
    }
}
