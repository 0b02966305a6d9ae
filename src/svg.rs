use std::fmt::{self, Write};

use tracing::warn;

use crate::measure::{Geometry, rounded_top_rect_path};
use crate::session::{RenderedLink, Scene, SceneTable};

pub const EMPTY_STATE_MESSAGE: &str = "Paste a schema.rb to see its diagram";

/// Writes a session [`Scene`] as a standalone SVG document: one viewport
/// group carrying the zoom transform, then the link, label and table layers
/// in paint order.
pub struct SvgRenderer {
    geometry: Geometry,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
        }
    }
}

impl SvgRenderer {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    pub fn render(&self, scene: &Scene<'_>, width: f64, height: f64) -> String {
        let mut svg = String::new();
        if let Err(e) = self.write_document(&mut svg, scene, width, height) {
            warn!(error = %e, "could not format svg document");
            svg.clear();
        }
        svg
    }

    fn write_document(
        &self,
        svg: &mut String,
        scene: &Scene<'_>,
        width: f64,
        height: f64,
    ) -> fmt::Result {
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        )?;
        writeln!(
            svg,
            r#"<style>
  .table-outline {{ fill: #fff; stroke: #d1d5db; }}
  .header {{ fill: #f3f4f6; }}
  .title {{ font: 600 14px sans-serif; fill: #111827; }}
  .row {{ fill: #fff; }}
  .row.alt {{ fill: #f9fafb; }}
  .cell-name {{ font: 13px sans-serif; fill: #374151; }}
  .cell-type {{ font: 12px monospace; fill: #6b7280; text-anchor: end; }}
  .link {{ fill: none; stroke-width: 1.5; }}
  .cardmark {{ font: 11px sans-serif; }}
  .dimmed {{ opacity: 0.15; }}
  .table.selected .table-outline {{ stroke: #dc2626; stroke-width: 2; }}
  .empty-state {{ font: 16px sans-serif; fill: #9ca3af; text-anchor: middle; }}
</style>"#
        )?;

        if scene.empty {
            writeln!(
                svg,
                r#"<text class="empty-state" x="{}" y="{}">{}</text>"#,
                width / 2.0,
                height / 2.0,
                EMPTY_STATE_MESSAGE
            )?;
            return writeln!(svg, "</svg>");
        }

        writeln!(svg, r#"<g class="viewport" transform="{}">"#, scene.transform.to_svg())?;

        writeln!(svg, r#"<g class="links">"#)?;
        for link in scene.links {
            write_link_path(svg, link)?;
        }
        writeln!(svg, "</g>")?;

        writeln!(svg, r#"<g class="labels">"#)?;
        for link in scene.links {
            write_link_labels(svg, link)?;
        }
        writeln!(svg, "</g>")?;

        writeln!(svg, r#"<g class="tables">"#)?;
        for table in &scene.tables {
            self.write_table(svg, table, scene)?;
        }
        writeln!(svg, "</g>")?;

        writeln!(svg, "</g>")?;
        writeln!(svg, "</svg>")
    }

    fn write_table(&self, svg: &mut String, t: &SceneTable<'_>, scene: &Scene<'_>) -> fmt::Result {
        let g = &self.geometry;
        let b = t.bbox;
        let mut class = String::from("table");
        if t.dimmed {
            class.push_str(" dimmed");
        }
        if t.selected {
            class.push_str(" selected");
        }
        writeln!(
            svg,
            r#"<g class="{class}" data-id="{}" transform="translate({},{})">"#,
            escape_xml(&b.id),
            b.x,
            b.y
        )?;
        writeln!(
            svg,
            r#"<rect class="table-outline" width="{}" height="{}" />"#,
            b.w, b.h
        )?;
        writeln!(
            svg,
            r#"<path class="header" d="{}" />"#,
            rounded_top_rect_path(b.w, g.header_height, g.header_radius)
        )?;
        writeln!(
            svg,
            r#"<text class="title" x="{}" y="{}">{}</text>"#,
            g.pad_x,
            g.header_height / 2.0 + 5.0,
            escape_xml(&t.table.id)
        )?;

        for (i, col) in t.table.fields.iter().enumerate() {
            let extra = if g.is_extra_row(i) {
                let display = if scene.extra_rows_visible {
                    ""
                } else {
                    r#" style="display:none""#
                };
                format!(r#" data-extra="1" opacity="{}"{display}"#, scene.extra_opacity)
            } else {
                String::new()
            };
            let y = g.header_height + i as f64 * g.row_height;
            let baseline = g.row_baseline(i);
            let alt = if i % 2 == 1 { " alt" } else { "" };
            writeln!(
                svg,
                r#"<rect class="row{alt}" x="0" y="{y}" width="{}" height="{}"{extra} />"#,
                b.w, g.row_height
            )?;
            writeln!(
                svg,
                r#"<text class="cell-name" x="{}" y="{baseline}"{extra}>{}</text>"#,
                g.pad_x,
                escape_xml(&col.name)
            )?;
            writeln!(
                svg,
                r#"<text class="cell-type" x="{}" y="{baseline}"{extra}>{}</text>"#,
                b.w - g.pad_x,
                escape_xml(&col.typ)
            )?;
        }
        writeln!(svg, "</g>")
    }
}

fn dimmed_class(base: &str, dimmed: bool) -> String {
    if dimmed {
        format!("{base} dimmed")
    } else {
        base.to_string()
    }
}

fn write_link_path(svg: &mut String, link: &RenderedLink) -> fmt::Result {
    let Some(route) = &link.route else {
        return Ok(());
    };
    writeln!(
        svg,
        r#"<path class="{}" d="{}" style="stroke:{}" data-from="{}" data-to="{}" />"#,
        dimmed_class("link", link.dimmed),
        route.path,
        link.color,
        escape_xml(&link.edge.from),
        escape_xml(&link.edge.to)
    )
}

fn write_link_labels(svg: &mut String, link: &RenderedLink) -> fmt::Result {
    let Some(route) = &link.route else {
        return Ok(());
    };
    let class = dimmed_class("cardmark", link.dimmed);
    for label in [&route.start_label, &route.end_label] {
        writeln!(
            svg,
            r#"<text class="{class}" x="{}" y="{}" text-anchor="{}" style="fill:{}">{}</text>"#,
            label.x,
            label.y,
            label.anchor.as_str(),
            link.color,
            label.text
        )?;
    }
    Ok(())
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
