//! Panel layouts - declarative panel/page/widget trees and their XML form
//!
//! The device accepts panels as an `<Extensions>` XML document. Layouts are
//! built as plain data first so tests can inspect them without parsing XML.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::PanelIds;
use crate::registry::DestinationRegistry;

const PANEL_ICON: &str = "Sliders";
const CONTROL_PANEL_COLOR: &str = "#CF7900";
const LAUNCHER_COLOR: &str = "#0000ff";

/// Where a panel shows up on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelLocation {
    /// Only reachable by opening it programmatically
    Hidden,
    HomeScreen,
    ControlPanel,
}

impl PanelLocation {
    /// Locations that get a launcher button
    pub const LAUNCHERS: [PanelLocation; 2] = [PanelLocation::HomeScreen, PanelLocation::ControlPanel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hidden => "Hidden",
            Self::HomeScreen => "HomeScreen",
            Self::ControlPanel => "ControlPanel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetKind {
    Button,
    /// Exclusive selector; keys are 1-based
    GroupButton { values: Vec<(u32, String)> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub widget_id: String,
    pub name: Option<String>,
    pub kind: WidgetKind,
    pub options: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub name: Option<String>,
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub rows: Vec<Row>,
    pub hide_row_names: bool,
}

/// One panel definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelLayout {
    pub location: PanelLocation,
    pub icon: String,
    pub color: String,
    pub name: String,
    pub order: Option<u32>,
    pub pages: Vec<Page>,
}

impl PanelLayout {
    /// The hidden control panel: a site selector page and a mode toggle page
    pub fn control_panel(
        name: &str,
        ids: &PanelIds,
        registry: &DestinationRegistry,
        toggle_label: &str,
        order: Option<u32>,
    ) -> Self {
        let values = registry
            .iter()
            .enumerate()
            .map(|(i, dest)| (i as u32 + 1, dest.label.clone()))
            .collect();

        let site_page = Page {
            name: "Site Select".to_string(),
            rows: vec![Row {
                name: None,
                widgets: vec![Widget {
                    widget_id: ids.site_group(),
                    name: None,
                    kind: WidgetKind::GroupButton { values },
                    options: "size=4;columns=1".to_string(),
                }],
            }],
            hide_row_names: true,
        };

        let mode_page = Page {
            name: "Kiosk Mode".to_string(),
            rows: vec![Row {
                name: Some("Kiosk Mode".to_string()),
                widgets: vec![Widget {
                    widget_id: ids.toggle(),
                    name: Some(toggle_label.to_string()),
                    kind: WidgetKind::Button,
                    options: "size=2".to_string(),
                }],
            }],
            hide_row_names: true,
        };

        Self {
            location: PanelLocation::Hidden,
            icon: PANEL_ICON.to_string(),
            color: CONTROL_PANEL_COLOR.to_string(),
            name: name.to_string(),
            order,
            pages: vec![site_page, mode_page],
        }
    }

    /// A page-less button that opens the hidden panel via a panel click event
    pub fn launcher(name: &str, location: PanelLocation, order: Option<u32>) -> Self {
        Self {
            location,
            icon: PANEL_ICON.to_string(),
            color: LAUNCHER_COLOR.to_string(),
            name: name.to_string(),
            order,
            pages: Vec::new(),
        }
    }

    /// Find a widget anywhere in the layout
    pub fn widget(&self, widget_id: &str) -> Option<&Widget> {
        self.pages
            .iter()
            .flat_map(|p| p.rows.iter())
            .flat_map(|r| r.widgets.iter())
            .find(|w| w.widget_id == widget_id)
    }

    /// Render the device's extension XML
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512);
        xml.push_str("<Extensions><Panel>");
        push_element(&mut xml, "Location", self.location.as_str());
        push_element(&mut xml, "Icon", &self.icon);
        push_element(&mut xml, "Color", &self.color);
        push_element(&mut xml, "Name", &self.name);
        if let Some(order) = self.order {
            let _ = write!(xml, "<Order>{}</Order>", order);
        }
        push_element(&mut xml, "ActivityType", "Custom");

        for page in &self.pages {
            xml.push_str("<Page>");
            push_element(&mut xml, "Name", &page.name);
            for row in &page.rows {
                xml.push_str("<Row>");
                if let Some(name) = &row.name {
                    push_element(&mut xml, "Name", name);
                }
                for widget in &row.widgets {
                    push_widget(&mut xml, widget);
                }
                xml.push_str("</Row>");
            }
            if page.hide_row_names {
                push_element(&mut xml, "Options", "hideRowNames=1");
            }
            xml.push_str("</Page>");
        }

        xml.push_str("</Panel></Extensions>");
        xml
    }
}

fn push_widget(xml: &mut String, widget: &Widget) {
    xml.push_str("<Widget>");
    push_element(xml, "WidgetId", &widget.widget_id);
    if let Some(name) = &widget.name {
        push_element(xml, "Name", name);
    }
    match &widget.kind {
        WidgetKind::Button => push_element(xml, "Type", "Button"),
        WidgetKind::GroupButton { values } => {
            push_element(xml, "Type", "GroupButton");
            push_element(xml, "Options", &widget.options);
            xml.push_str("<ValueSpace>");
            for (key, name) in values {
                let _ = write!(xml, "<Value><Key>{}</Key>", key);
                push_element(xml, "Name", name);
                xml.push_str("</Value>");
            }
            xml.push_str("</ValueSpace>");
            xml.push_str("</Widget>");
            return;
        }
    }
    push_element(xml, "Options", &widget.options);
    xml.push_str("</Widget>");
}

fn push_element(xml: &mut String, tag: &str, text: &str) {
    let _ = write!(xml, "<{tag}>{}</{tag}>", escape(text));
}

/// Escape text content for XML
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
