//! TSPL command builder and label compiler
//!
//! Provides a fluent API for building TSPL print programs, plus the fixed
//! 40x30mm price label layout used by the print agent.
//!
//! Every compiled program is self-contained: it re-states label size, gap,
//! direction and reference point before any content. The printer's gap
//! sensor tracks label boundaries from that reference; a program without it
//! lets the sensor drift until content slides across label edges.

use shared::PrintItem;
use shared::price::format_minor_units;

/// TSPL command builder
///
/// Builds TSPL text programs for thermal label printers. String arguments
/// are escaped; commands are newline-terminated.
pub struct TsplBuilder {
    buf: String,
}

impl TsplBuilder {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(512),
        }
    }

    fn command(&mut self, cmd: &str) -> &mut Self {
        self.buf.push_str(cmd);
        self.buf.push('\n');
        self
    }

    // === Physical Setup ===

    /// Label size in millimeters
    pub fn size_mm(&mut self, width: u32, height: u32) -> &mut Self {
        self.command(&format!("SIZE {} mm, {} mm", width, height))
    }

    /// Gap between labels in millimeters
    pub fn gap_mm(&mut self, gap: u32, offset: u32) -> &mut Self {
        self.command(&format!("GAP {} mm, {} mm", gap, offset))
    }

    /// Print direction (0 or 1)
    pub fn direction(&mut self, direction: u8) -> &mut Self {
        self.command(&format!("DIRECTION {}", direction))
    }

    /// Reference point the gap sensor measures label boundaries from
    pub fn reference(&mut self, x: u32, y: u32) -> &mut Self {
        self.command(&format!("REFERENCE {}, {}", x, y))
    }

    /// Extra feed offset in millimeters
    pub fn offset_mm(&mut self, offset: u32) -> &mut Self {
        self.command(&format!("OFFSET {} mm", offset))
    }

    /// Toggle a printer feature (PEEL, CUTTER, TEAR, ...)
    pub fn set_flag(&mut self, flag: &str, on: bool) -> &mut Self {
        let state = if on { "ON" } else { "OFF" };
        self.command(&format!("SET {} {}", flag, state))
    }

    /// Clear the internal bitmap buffer
    pub fn cls(&mut self) -> &mut Self {
        self.command("CLS")
    }

    // === Content ===

    /// Text element at dot coordinates with a built-in font
    pub fn text(
        &mut self,
        x: i32,
        y: i32,
        font: &str,
        rotation: u16,
        xmul: u8,
        ymul: u8,
        content: &str,
    ) -> &mut Self {
        self.command(&format!(
            "TEXT {},{},\"{}\",{},{},{},\"{}\"",
            x,
            y,
            font,
            rotation,
            xmul,
            ymul,
            escape(content)
        ))
    }

    /// Code 39 barcode element
    #[allow(clippy::too_many_arguments)]
    pub fn barcode39(
        &mut self,
        x: i32,
        y: i32,
        height: u32,
        readable: bool,
        rotation: u16,
        narrow: u8,
        wide: u8,
        content: &str,
    ) -> &mut Self {
        self.command(&format!(
            "BARCODE {},{},\"39\",{},{},{},{},{},\"{}\"",
            x,
            y,
            height,
            readable as u8,
            rotation,
            narrow,
            wide,
            escape(content)
        ))
    }

    // === Print ===

    /// Print the buffered label
    pub fn print(&mut self, copies: u32) -> &mut Self {
        self.command(&format!("PRINT {}", copies))
    }

    // === Build ===

    /// Build the final byte program
    pub fn build(self) -> Vec<u8> {
        self.buf.into_bytes()
    }
}

impl Default for TsplBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape a string for a quoted TSPL argument
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ============================================================================
// Label Geometry
// ============================================================================

/// Physical and layout constants for the 40x30mm price label
///
/// All fixed coordinates live here so a different label stock only needs a
/// different geometry value, not new transmission logic.
#[derive(Debug, Clone)]
pub struct LabelGeometry {
    /// Label width in millimeters
    pub width_mm: u32,
    /// Label height in millimeters
    pub height_mm: u32,
    /// Gap between labels in millimeters
    pub gap_mm: u32,
    /// Printable width in dots (40mm at 203dpi)
    pub width_dots: i32,
    /// Horizontal compensation added to every centered X coordinate.
    /// The print head sits slightly left of the label on this hardware.
    pub horizontal_shift_dots: i32,
    /// Title is truncated to this many characters, never re-wrapped
    pub title_max_chars: usize,
    pub title_y: i32,
    pub variant_y: i32,
    pub barcode_y: i32,
    pub price_y: i32,
    pub sku_y: i32,
    pub barcode_height: u32,
    pub barcode_narrow: u8,
    pub barcode_wide: u8,
}

impl Default for LabelGeometry {
    fn default() -> Self {
        Self {
            width_mm: 40,
            height_mm: 30,
            gap_mm: 2,
            width_dots: 320,
            horizontal_shift_dots: 16,
            title_max_chars: 30,
            title_y: 10,
            variant_y: 40,
            barcode_y: 70,
            price_y: 150,
            sku_y: 210,
            barcode_height: 60,
            barcode_narrow: 2,
            barcode_wide: 4,
        }
    }
}

/// Dot width of one character in a built-in TSPL font
fn font_char_width(font: &str) -> i32 {
    match font {
        "1" => 8,
        "2" => 12,
        "3" => 16,
        "4" => 24,
        "5" => 32,
        "6" | "7" | "8" => 14,
        _ => 8,
    }
}

/// Centered X for a text element, shifted by the horizontal compensation
fn centered_text_x(geometry: &LabelGeometry, text: &str, font: &str, xmul: u8) -> i32 {
    let char_w = font_char_width(font) * i32::from(xmul.max(1));
    let width = text.chars().count() as i32 * char_w;
    ((geometry.width_dots - width) / 2).max(0) + geometry.horizontal_shift_dots
}

/// Centered X for a Code 39 barcode
///
/// Width model: start/stop add two characters, each character is
/// 3 wide + 6 narrow modules, with a narrow inter-character gap.
fn centered_barcode_x(geometry: &LabelGeometry, payload: &str, narrow: u8, wide: u8) -> i32 {
    let n = i32::from(narrow.max(1));
    let w = i32::from(wide).max(n);
    let chars = payload.chars().count() as i32 + 2;
    let per_char = 3 * w + 6 * n;
    let width = chars * per_char + (chars - 1) * n;
    ((geometry.width_dots - width) / 2).max(0) + geometry.horizontal_shift_dots
}

// ============================================================================
// Code 39 Normalization
// ============================================================================

/// Normalize a payload into the Code 39 character set
///
/// Uppercases letters and replaces anything the symbology cannot encode
/// with `-`. Deterministic; never fails, so one odd SKU cannot abort a
/// whole job.
pub fn normalize_code39(payload: &str) -> String {
    payload
        .chars()
        .map(|c| {
            let upper = c.to_ascii_uppercase();
            if is_code39_char(upper) { upper } else { '-' }
        })
        .collect()
}

fn is_code39_char(c: char) -> bool {
    c.is_ascii_uppercase()
        || c.is_ascii_digit()
        || matches!(c, ' ' | '-' | '.' | '$' | '/' | '+' | '%')
}

// ============================================================================
// Compilation
// ============================================================================

/// Emit the physical setup block shared by every program.
///
/// This must precede any content on every distinct print or calibration
/// operation; printer state is not assumed to survive power cycles.
fn setup(builder: &mut TsplBuilder, geometry: &LabelGeometry) {
    builder
        .size_mm(geometry.width_mm, geometry.height_mm)
        .gap_mm(geometry.gap_mm, 0)
        .direction(0)
        .reference(0, 0)
        .offset_mm(0)
        .set_flag("PEEL", false)
        .set_flag("CUTTER", false)
        .set_flag("PARTIAL_CUTTER", false)
        .set_flag("TEAR", true)
        .cls();
}

/// Compile one print item into a single-label TSPL program
///
/// Pure function of its inputs: identical item and geometry always produce
/// byte-identical output. Always prints exactly one copy; batches are
/// sequential programs so a failure attributes to a specific label.
pub fn compile_label(item: &PrintItem, geometry: &LabelGeometry) -> Vec<u8> {
    let title: String = item.title.chars().take(geometry.title_max_chars).collect();
    let code39 = normalize_code39(item.effective_code39());
    let price = format_minor_units(item.price_minor_units, &item.currency);

    let mut builder = TsplBuilder::new();
    setup(&mut builder, geometry);

    builder.text(
        centered_text_x(geometry, &title, "3", 1),
        geometry.title_y,
        "3",
        0,
        1,
        1,
        &title,
    );

    if !item.variant_label.is_empty() {
        builder.text(
            centered_text_x(geometry, &item.variant_label, "2", 1),
            geometry.variant_y,
            "2",
            0,
            1,
            1,
            &item.variant_label,
        );
    }

    builder.barcode39(
        centered_barcode_x(geometry, &code39, geometry.barcode_narrow, geometry.barcode_wide),
        geometry.barcode_y,
        geometry.barcode_height,
        true,
        0,
        geometry.barcode_narrow,
        geometry.barcode_wide,
        &code39,
    );

    builder.text(
        centered_text_x(geometry, &price, "4", 2),
        geometry.price_y,
        "4",
        0,
        2,
        2,
        &price,
    );

    builder.text(
        centered_text_x(geometry, &item.sku, "1", 1),
        geometry.sku_y,
        "1",
        0,
        1,
        1,
        &item.sku,
    );

    builder.print(1);
    builder.build()
}

/// Compile a calibration program: setup block plus one blank feed
///
/// Sent once when a printer session first touches a device so the gap
/// sensor re-locks onto label boundaries.
pub fn compile_calibration(geometry: &LabelGeometry) -> Vec<u8> {
    let mut builder = TsplBuilder::new();
    setup(&mut builder, geometry);
    builder.print(1);
    builder.build()
}

/// Compile the fixed alignment test label
///
/// Printed after calibration so the operator can confirm content lands
/// inside the label boundaries.
pub fn compile_test_label(geometry: &LabelGeometry) -> Vec<u8> {
    let item = PrintItem {
        sku: "TEST-001".to_string(),
        title: "TEST LABEL".to_string(),
        variant_label: "Calibration Test".to_string(),
        price_minor_units: 9999,
        currency: "ZAR".to_string(),
        code39_payload: "TEST001".to_string(),
        qty_to_print: 1,
    };
    compile_label(&item, geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, title: &str, qty: u32) -> PrintItem {
        PrintItem {
            sku: sku.to_string(),
            title: title.to_string(),
            variant_label: String::new(),
            price_minor_units: 15900,
            currency: "ZAR".to_string(),
            code39_payload: String::new(),
            qty_to_print: qty,
        }
    }

    #[test]
    fn test_compile_is_deterministic() {
        let geometry = LabelGeometry::default();
        let a = compile_label(&item("KD-001", "Kandora Premium", 2), &geometry);
        let b = compile_label(&item("KD-001", "Kandora Premium", 2), &geometry);
        assert_eq!(a, b);
    }

    #[test]
    fn test_setup_block_precedes_content() {
        let geometry = LabelGeometry::default();
        let program = String::from_utf8(compile_label(&item("A", "B", 1), &geometry)).unwrap();
        let lines: Vec<&str> = program.lines().collect();

        assert_eq!(lines[0], "SIZE 40 mm, 30 mm");
        assert_eq!(lines[1], "GAP 2 mm, 0 mm");
        assert_eq!(lines[2], "DIRECTION 0");
        assert_eq!(lines[3], "REFERENCE 0, 0");

        let cls = lines.iter().position(|l| *l == "CLS").unwrap();
        let first_text = lines.iter().position(|l| l.starts_with("TEXT")).unwrap();
        assert!(cls < first_text);
    }

    #[test]
    fn test_single_copy_per_program() {
        let geometry = LabelGeometry::default();
        let program = String::from_utf8(compile_label(&item("A", "B", 5), &geometry)).unwrap();
        // qty is batch information, not a copy count
        assert!(program.ends_with("PRINT 1\n"));
        assert_eq!(program.matches("PRINT").count(), 1);
    }

    #[test]
    fn test_price_text_is_exact() {
        let geometry = LabelGeometry::default();
        let program = String::from_utf8(compile_label(&item("A", "B", 1), &geometry)).unwrap();
        assert!(program.contains("\"R159.00\""));
        assert!(!program.contains("158.99"));
    }

    #[test]
    fn test_title_truncated_not_wrapped() {
        let geometry = LabelGeometry::default();
        let long = "An Exceedingly Long Product Title That Keeps Going";
        let program = String::from_utf8(compile_label(&item("A", long, 1), &geometry)).unwrap();

        let expected: String = long.chars().take(30).collect();
        assert!(program.contains(&format!("\"{}\"", expected)));
        assert!(!program.contains(long));
        // one title line only
        assert_eq!(program.matches("TEXT").count(), 3); // title + price + sku
    }

    #[test]
    fn test_empty_title_emits_empty_field() {
        let geometry = LabelGeometry::default();
        let program = String::from_utf8(compile_label(&item("A", "", 1), &geometry)).unwrap();
        assert!(program.contains(",10,\"3\",0,1,1,\"\""));
    }

    #[test]
    fn test_variant_line_skipped_when_empty() {
        let geometry = LabelGeometry::default();
        let mut it = item("A", "B", 1);
        let without = String::from_utf8(compile_label(&it, &geometry)).unwrap();
        assert!(!without.contains(",40,\"2\""));

        it.variant_label = "Blue / M".to_string();
        let with = String::from_utf8(compile_label(&it, &geometry)).unwrap();
        assert!(with.contains("\"Blue / M\""));
    }

    #[test]
    fn test_code39_falls_back_to_sku() {
        let geometry = LabelGeometry::default();
        let program = String::from_utf8(compile_label(&item("KD-001", "B", 1), &geometry)).unwrap();
        assert!(program.contains("\"39\""));
        assert!(program.contains(",\"KD-001\"\n"));
    }

    #[test]
    fn test_escape_quotes_and_backslashes() {
        let geometry = LabelGeometry::default();
        let it = item("A", "10\" \\ Special", 1);
        let program = String::from_utf8(compile_label(&it, &geometry)).unwrap();
        assert!(program.contains("\"10\\\" \\\\ Special\""));
    }

    #[test]
    fn test_calibration_has_no_content() {
        let geometry = LabelGeometry::default();
        let program = String::from_utf8(compile_calibration(&geometry)).unwrap();

        assert!(program.starts_with("SIZE 40 mm, 30 mm\n"));
        assert!(program.contains("REFERENCE 0, 0\n"));
        assert!(program.contains("CLS\n"));
        assert!(program.ends_with("PRINT 1\n"));
        assert!(!program.contains("TEXT"));
        assert!(!program.contains("BARCODE"));
    }

    #[test]
    fn test_normalize_code39() {
        assert_eq!(normalize_code39("abc123"), "ABC123");
        assert_eq!(normalize_code39("KD-001.5 $/+%"), "KD-001.5 $/+%");
        assert_eq!(normalize_code39("kd_001*"), "KD-001-");
        assert_eq!(normalize_code39("Ärmel"), "-RMEL");
        assert_eq!(normalize_code39(""), "");
    }

    #[test]
    fn test_centering_never_negative() {
        let geometry = LabelGeometry::default();
        let wide = "W".repeat(60);
        let x = centered_text_x(&geometry, &wide, "5", 2);
        // clamped to zero before the shift is applied
        assert_eq!(x, geometry.horizontal_shift_dots);

        let bx = centered_barcode_x(&geometry, &wide, 2, 4);
        assert_eq!(bx, geometry.horizontal_shift_dots);
    }

    #[test]
    fn test_font_width_table() {
        assert_eq!(font_char_width("1"), 8);
        assert_eq!(font_char_width("4"), 24);
        assert_eq!(font_char_width("7"), 14);
        assert_eq!(font_char_width("unknown"), 8);
    }
}
