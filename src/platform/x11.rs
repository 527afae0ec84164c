use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xkb::{self, ConnectionExt as XkbExt};
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt as _, Window};
use x11rb::rust_connection::RustConnection;

use super::{locale, InputLayouts};
use crate::constants::x11;
use crate::layout::LayoutId;

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub net_active_window: Atom,
    pub xkb_rules_names: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            net_active_window: conn.intern_atom(false, x11::NET_ACTIVE_WINDOW)
                .context("Failed to intern _NET_ACTIVE_WINDOW atom")?
                .reply()
                .context("Failed to get reply for _NET_ACTIVE_WINDOW atom")?
                .atom,
            xkb_rules_names: conn.intern_atom(false, x11::XKB_RULES_NAMES)
                .context("Failed to intern _XKB_RULES_NAMES atom")?
                .reply()
                .context("Failed to get reply for _XKB_RULES_NAMES atom")?
                .atom,
        })
    }
}

/// Connection to the X server used for layout detection and screen metrics
pub struct X11Session {
    conn: RustConnection,
    root: Window,
    screen_size: (u32, u32),
    atoms: CachedAtoms,
}

impl X11Session {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)
            .context("Failed to connect to the X server")?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_size = (
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        );
        info!(screen = screen_num, width = screen_size.0, height = screen_size.1, "Connected to X11");

        let xkb = conn
            .xkb_use_extension(x11::XKB_MAJOR_VERSION, x11::XKB_MINOR_VERSION)
            .context("Failed to query XKB extension")?
            .reply()
            .context("Failed to get reply for XKB extension query")?;
        if !xkb.supported {
            bail!(
                "X server does not support XKB {}.{} (server has {}.{})",
                x11::XKB_MAJOR_VERSION,
                x11::XKB_MINOR_VERSION,
                xkb.server_major,
                xkb.server_minor
            );
        }

        let atoms = CachedAtoms::new(&conn)?;
        Ok(Self {
            conn,
            root,
            screen_size,
            atoms,
        })
    }

    pub fn screen_size(&self) -> (u32, u32) {
        self.screen_size
    }

    /// XKB layout short names in group order, read from `_XKB_RULES_NAMES`
    fn layout_names(&self) -> Result<Vec<String>> {
        let prop = self
            .conn
            .get_property(false, self.root, self.atoms.xkb_rules_names, AtomEnum::STRING, 0, 1024)
            .context("Failed to query _XKB_RULES_NAMES property")?
            .reply()
            .context("Failed to get reply for _XKB_RULES_NAMES query")?;
        Ok(parse_rules_layouts(&prop.value))
    }

    fn active_window(&self) -> Result<Option<Window>> {
        let prop = self
            .conn
            .get_property(false, self.root, self.atoms.net_active_window, AtomEnum::WINDOW, 0, 1)
            .context("Failed to query _NET_ACTIVE_WINDOW property")?
            .reply()
            .context("Failed to get reply for _NET_ACTIVE_WINDOW query")?;
        Ok(prop
            .value32()
            .and_then(|mut values| values.next())
            .filter(|&window| window != x11rb::NONE))
    }

    fn active_group(&self) -> Result<usize> {
        let state = self
            .conn
            .xkb_get_state(xkb::ID::USE_CORE_KBD.into())
            .context("Failed to query XKB state")?
            .reply()
            .context("Failed to get reply for XKB state query")?;
        Ok(usize::from(u8::from(state.group)))
    }

    fn foreground_layout(&self) -> Result<Option<LayoutId>> {
        let Some(window) = self.active_window()? else {
            return Ok(None);
        };
        let group = self.active_group()?;
        let names = self.layout_names()?;
        let id = names.get(group).map(|name| locale::id_for_xkb_name(name));
        debug!(window, group, layout = ?id, "Foreground layout");
        Ok(id)
    }
}

impl InputLayouts for X11Session {
    fn installed(&self) -> BTreeSet<LayoutId> {
        match self.layout_names() {
            Ok(names) => {
                info!(layouts = ?names, "Installed keyboard layouts");
                names.iter().map(|name| locale::id_for_xkb_name(name)).collect()
            }
            Err(e) => {
                debug!(error = ?e, "Failed to enumerate keyboard layouts");
                BTreeSet::new()
            }
        }
    }

    fn foreground(&self) -> Option<LayoutId> {
        self.foreground_layout()
            .inspect_err(|e| debug!(error = ?e, "Foreground layout query failed"))
            .ok()
            .flatten()
    }

    fn language_name(&self, id: LayoutId) -> String {
        if let Some(info) = locale::by_id(id) {
            return info.native_name.to_string();
        }
        // Synthetic ids: show the XKB name they were derived from
        self.layout_names()
            .ok()
            .and_then(|names| names.into_iter().find(|name| locale::id_for_xkb_name(name) == id))
            .unwrap_or_else(|| id.to_string())
    }

    fn country_code(&self, id: LayoutId) -> Option<String> {
        locale::by_id(id).map(|info| info.country.to_string())
    }
}

/// Extract the layout list (third NUL-separated field) from `_XKB_RULES_NAMES`
///
/// The property reads `rules\0model\0layouts\0variants\0options\0`, layouts comma separated.
pub fn parse_rules_layouts(raw: &[u8]) -> Vec<String> {
    raw.split(|&b| b == 0)
        .nth(2)
        .map(|field| {
            String::from_utf8_lossy(field)
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules_layouts_two_groups() {
        let raw = b"evdev\0pc105\0us,fr\0,\0grp:alt_shift_toggle\0";
        assert_eq!(parse_rules_layouts(raw), vec!["us", "fr"]);
    }

    #[test]
    fn test_parse_rules_layouts_single_group() {
        let raw = b"evdev\0pc105\0de\0nodeadkeys\0\0";
        assert_eq!(parse_rules_layouts(raw), vec!["de"]);
    }

    #[test]
    fn test_parse_rules_layouts_missing_field() {
        assert!(parse_rules_layouts(b"").is_empty());
        assert!(parse_rules_layouts(b"evdev\0pc105").is_empty());
        assert!(parse_rules_layouts(b"evdev\0pc105\0\0").is_empty());
    }
}
