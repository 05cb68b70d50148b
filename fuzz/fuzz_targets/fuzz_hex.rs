#![no_main]

//! Hex geometry fuzzer: distance, neighbors and line rasterization on arbitrary coordinates.

use arbitrary::Arbitrary;
use hexconquest::Coord;
use libfuzzer_sys::fuzz_target;

/// Two coordinates in a window large enough to hit sign and parity edge cases.
#[derive(Arbitrary, Debug)]
struct HexInput {
    ax: i16,
    ay: i16,
    bx: i16,
    by: i16,
}

fuzz_target!(|input: HexInput| {
    // Keep lines short enough to rasterize quickly.
    let a = Coord::new(i32::from(input.ax % 512), i32::from(input.ay % 512));
    let b = Coord::new(i32::from(input.bx % 512), i32::from(input.by % 512));

    let d = a.distance(b);
    assert_eq!(d, b.distance(a), "distance not symmetric for {a} {b}");
    assert_eq!(d == 0, a == b);

    for n in a.neighbors() {
        assert_eq!(a.distance(n), 1, "neighbor {n} of {a} not at distance 1");
        assert!(n.is_adjacent(a));
    }

    let line = a.line_to(b);
    assert_eq!(line.first(), Some(&a));
    assert_eq!(line.last(), Some(&b));
    assert_eq!(line.len(), d as usize + 1, "line {a} -> {b} has wrong length");
    for pair in line.windows(2) {
        assert!(pair[0].is_adjacent(pair[1]), "line {a} -> {b} jumps {} -> {}", pair[0], pair[1]);
    }

    let axial = a.to_axial();
    assert_eq!(axial.to_offset(), a);
});
