//! Hosts known to the detector, grouped by what kind of downloads they serve.
//! A host belongs to a group if it contains one of the group's entries.

use super::category::UrlCategory;

const VIDEO: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "twitch.tv",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "tiktok.com",
    "soundcloud.com",
    "bandcamp.com",
];

const CLOUD: &[&str] = &[
    "drive.google.com",
    "docs.google.com",
    "mega.nz",
    "mega.co.nz",
    "dropbox.com",
    "onedrive.live.com",
    "1drv.ms",
    "box.com",
    "pcloud.com",
    "mediafire.com",
    "zippyshare.com",
];

const FILEHOST: &[&str] = &[
    "anonfiles.com",
    "hotfile.io",
    "bayfiles.com",
    "megaupload.nz",
    "letsupload.cc",
    "filechan.org",
    "myfile.is",
    "vshare.is",
    "rapidshare.nu",
    "lolabits.se",
    "openload.cc",
    "share-online.is",
    "upvid.cc",
    "1fichier.com",
    "2shared.com",
    "4shared.com",
    "alfafile.net",
    "anzfile.net",
    "clicknupload.cc",
    "dailyuploads.net",
    "ddownload.com",
    "depositfiles.com",
    "desiupload.co",
    "drop.download",
    "earn4files.com",
    "easybytez.com",
    "extmatrix.com",
    "fastclick.to",
    "file4go.com",
    "filebin.ca",
    "filecandy.net",
    "filefactory.com",
    "filejoker.net",
    "filerio.in",
    "filesmonster.com",
    "fileup.cc",
    "fshare.vn",
    "gofile.io",
    "hexupload.net",
    "hitfile.net",
    "icerbox.com",
    "isra.cloud",
    "katfile.com",
    "keep2share.cc",
    "littlebyte.net",
    "lufi.io",
    "mexa.sh",
    "mixdrop.co",
    "nitroflare.com",
    "nofile.io",
    "racaty.net",
    "rapidgator.net",
    "rg.to",
    "send.cm",
    "sendspace.com",
    "solidfiles.com",
    "streamtape.com",
    "temp.sh",
    "turbobit.net",
    "uploadbox.io",
    "uploadee.com",
    "uploadhaven.com",
    "uploading.vn",
    "uploadrar.com",
    "usersdrive.com",
    "usersfiles.com",
    "we.tl",
    "wetransfer.com",
    "workupload.com",
    "xubster.com",
    "yadi.sk",
    "disk.yandex.ru",
];

/// Link generators that resolve to direct downloads.
const DIRECT: &[&str] = &[
    "gdtot.me",
    "gdtot.pro",
    "gdflix.top",
    "gdflix.pro",
    "filepress.store",
    "filebee.net",
    "appdrive.in",
    "driveapp.in",
    "drivehub.ws",
    "gdrive.vip",
    "hubdrive.in",
    "katdrive.net",
    "kolop.icu",
    "sharer.pw",
    "shrdsk.me",
    "drivesharer.in",
];

/// Torrent trackers and indexes.
const TORRENT: &[&str] = &[
    "thepiratebay.org",
    "1337x.to",
    "rarbg.to",
    "torrentz2.eu",
    "kickasstorrents.to",
    "limetorrents.info",
    "torlock.com",
    "nyaa.si",
    "eztv.re",
    "yts.mx",
    "magnetdl.com",
];

const ARCHIVE: &[&str] = &["archive.org", "web.archive.org"];

/// Groups in the order they are checked. The first group with a matching entry wins.
pub static CATEGORY_DOMAINS: &[(UrlCategory, &[&str])] = &[
    (UrlCategory::Video, VIDEO),
    (UrlCategory::Cloud, CLOUD),
    (UrlCategory::Filehost, FILEHOST),
    (UrlCategory::Direct, DIRECT),
    (UrlCategory::Torrent, TORRENT),
    (UrlCategory::Archive, ARCHIVE),
];

/// Find the group this host belongs to.
pub fn lookup(host: &str) -> Option<UrlCategory> {
    if host.is_empty() {
        return None;
    }

    CATEGORY_DOMAINS
        .iter()
        .find(|(_, domains)| domains.iter().any(|d| host.contains(d)))
        .map(|(category, _)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_lookup() {
        assert_eq!(lookup("vimeo.com"), Some(UrlCategory::Video));
        assert_eq!(lookup("www.dropbox.com"), Some(UrlCategory::Cloud));
        assert_eq!(lookup("eu.gofile.io"), Some(UrlCategory::Filehost));
        assert_eq!(lookup("nyaa.si"), Some(UrlCategory::Torrent));
        assert_eq!(lookup("web.archive.org"), Some(UrlCategory::Archive));
        assert_eq!(lookup("example.com"), None);
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn earlier_groups_win() {
        // "gdrive.vip" is a direct link generator, but nothing earlier claims it.
        assert_eq!(lookup("gdrive.vip"), Some(UrlCategory::Direct));
        // Contains "box.com", which is a cloud entry.
        assert_eq!(lookup("uploadbox.com"), Some(UrlCategory::Cloud));
    }
}
