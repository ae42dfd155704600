//! # Golden Tests
//!
//! Byte-exact expectations for compiled label programs. The label layout is
//! a wire contract with the printer: a coordinate change here means the
//! content physically moves on the label, so any diff in these tests needs
//! a deliberate decision, not a regeneration.

use shared::PrintItem;
use tern_printer::{LabelGeometry, compile_calibration, compile_label, compile_test_label};

#[test]
fn golden_test_label_program() {
    let program = compile_test_label(&LabelGeometry::default());

    let expected = "\
SIZE 40 mm, 30 mm
GAP 2 mm, 0 mm
DIRECTION 0
REFERENCE 0, 0
OFFSET 0 mm
SET PEEL OFF
SET CUTTER OFF
SET PARTIAL_CUTTER OFF
SET TEAR ON
CLS
TEXT 96,10,\"3\",0,1,1,\"TEST LABEL\"
TEXT 80,40,\"2\",0,1,1,\"Calibration Test\"
BARCODE 60,70,\"39\",60,1,0,2,4,\"TEST001\"
TEXT 32,150,\"4\",0,2,2,\"R99.99\"
TEXT 144,210,\"1\",0,1,1,\"TEST-001\"
PRINT 1
";

    assert_eq!(String::from_utf8(program).unwrap(), expected);
}

#[test]
fn golden_calibration_program() {
    let program = compile_calibration(&LabelGeometry::default());

    let expected = "\
SIZE 40 mm, 30 mm
GAP 2 mm, 0 mm
DIRECTION 0
REFERENCE 0, 0
OFFSET 0 mm
SET PEEL OFF
SET CUTTER OFF
SET PARTIAL_CUTTER OFF
SET TEAR ON
CLS
PRINT 1
";

    assert_eq!(String::from_utf8(program).unwrap(), expected);
}

#[test]
fn golden_item_with_variant_and_normalized_barcode() {
    let item = PrintItem {
        sku: "KD-0042".to_string(),
        title: "Kandora Premium".to_string(),
        variant_label: "White / L".to_string(),
        price_minor_units: 15900,
        currency: "ZAR".to_string(),
        code39_payload: "kd_0042".to_string(),
        qty_to_print: 3,
    };

    let program = String::from_utf8(compile_label(&item, &LabelGeometry::default())).unwrap();

    // "kd_0042" uppercases and maps the underscore to the placeholder
    assert!(program.contains("BARCODE 60,70,\"39\",60,1,0,2,4,\"KD-0042\""));
    // 7 chars at double width overflow 320 dots; X clamps to the shift
    assert!(program.contains("TEXT 16,150,\"4\",0,2,2,\"R159.00\""));
}
