//! Mapping between XKB layout names and Windows-style locale ids
//!
//! XKB only knows short layout names ("us", "fr"). The rest of the crate keys
//! everything by numeric locale id, so each known name is mapped to its LANGID
//! together with the country code and native language name.

use crate::layout::LayoutId;

/// One row of the locale table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleInfo {
    pub xkb_name: &'static str,
    pub id: u16,
    pub country: &'static str,
    pub native_name: &'static str,
}

const fn row(xkb_name: &'static str, id: u16, country: &'static str, native_name: &'static str) -> LocaleInfo {
    LocaleInfo { xkb_name, id, country, native_name }
}

pub const LOCALES: &[LocaleInfo] = &[
    row("us", 0x0409, "US", "English"),
    row("gb", 0x0809, "GB", "English"),
    row("fr", 0x040C, "FR", "français"),
    row("be", 0x080C, "BE", "français"),
    row("ca", 0x0C0C, "CA", "français"),
    row("ch", 0x0807, "CH", "Deutsch"),
    row("de", 0x0407, "DE", "Deutsch"),
    row("at", 0x0C07, "AT", "Deutsch"),
    row("es", 0x0C0A, "ES", "español"),
    row("latam", 0x580A, "MX", "español"),
    row("it", 0x0410, "IT", "italiano"),
    row("pt", 0x0816, "PT", "português"),
    row("br", 0x0416, "BR", "português"),
    row("nl", 0x0413, "NL", "Nederlands"),
    row("se", 0x041D, "SE", "svenska"),
    row("no", 0x0414, "NO", "norsk bokmål"),
    row("dk", 0x0406, "DK", "dansk"),
    row("fi", 0x040B, "FI", "suomi"),
    row("is", 0x040F, "IS", "íslenska"),
    row("ee", 0x0425, "EE", "eesti"),
    row("lv", 0x0426, "LV", "latviešu"),
    row("lt", 0x0427, "LT", "lietuvių"),
    row("pl", 0x0415, "PL", "polski"),
    row("cz", 0x0405, "CZ", "čeština"),
    row("sk", 0x041B, "SK", "slovenčina"),
    row("hu", 0x040E, "HU", "magyar"),
    row("ro", 0x0418, "RO", "română"),
    row("si", 0x0424, "SI", "slovenščina"),
    row("hr", 0x041A, "HR", "hrvatski"),
    row("rs", 0x241A, "RS", "српски"),
    row("bg", 0x0402, "BG", "български"),
    row("gr", 0x0408, "GR", "Ελληνικά"),
    row("tr", 0x041F, "TR", "Türkçe"),
    row("ru", 0x0419, "RU", "русский"),
    row("ua", 0x0422, "UA", "українська"),
    row("by", 0x0423, "BY", "беларуская"),
    row("kz", 0x043F, "KZ", "қазақ тілі"),
    row("ge", 0x0437, "GE", "ქართული"),
    row("am", 0x042B, "AM", "Հայերեն"),
    row("il", 0x040D, "IL", "עברית"),
    row("ara", 0x0401, "SA", "العربية"),
    row("ir", 0x0429, "IR", "فارسی"),
    row("in", 0x4009, "IN", "English"),
    row("th", 0x041E, "TH", "ไทย"),
    row("vn", 0x042A, "VN", "Tiếng Việt"),
    row("jp", 0x0411, "JP", "日本語"),
    row("kr", 0x0412, "KR", "한국어"),
    row("cn", 0x0804, "CN", "中文"),
    row("tw", 0x0404, "TW", "中文"),
];

/// Lower bound of ids synthesized for layout names missing from the table
const SYNTHETIC_ID_BASE: u16 = 0x8000;

pub fn by_xkb_name(name: &str) -> Option<&'static LocaleInfo> {
    LOCALES.iter().find(|info| info.xkb_name == name)
}

pub fn by_id(id: LayoutId) -> Option<&'static LocaleInfo> {
    LOCALES.iter().find(|info| info.id == id.get())
}

/// Stable id for an XKB layout name
///
/// Unknown names hash (FNV-1a) into `0x8000..=0xFFFF`, which no table row uses.
pub fn id_for_xkb_name(name: &str) -> LayoutId {
    if let Some(info) = by_xkb_name(name) {
        return LayoutId(info.id);
    }

    let hash = name.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    });
    LayoutId(SYNTHETIC_ID_BASE | (hash & 0x7FFF) as u16)
}
