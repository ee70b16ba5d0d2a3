//! Byte-exact wire behavior of the slice API: prefix choice at every width
//! boundary, round trips, skip arithmetic, and error surfaces.

use mopack::read_bytes::{
    read_array_header, read_bin, read_bool, read_i64, read_map_header, read_nil,
    read_sized_array_header, read_str, read_u64, skip,
};
use mopack::write_bytes::{
    append_array_header, append_bin, append_bool, append_i64, append_map_header, append_nil,
    append_str, append_u64,
};
use mopack::{read_value, Error, Value};

#[test]
fn two_entry_map_is_byte_exact() {
    let mut buf = Vec::new();
    append_map_header(&mut buf, 2);
    append_str(&mut buf, "a");
    append_i64(&mut buf, 1);
    append_str(&mut buf, "b");
    append_i64(&mut buf, 2);
    assert_eq!(buf, [0x82, 0xa1, 0x61, 0x01, 0xa1, 0x62, 0x02]);

    let (value, rest) = read_value(&buf).unwrap();
    assert!(rest.is_empty());
    assert_eq!(
        value,
        Value::Map(vec![
            ("a".to_owned(), Value::Int(1)),
            ("b".to_owned(), Value::Int(2)),
        ])
    );

    assert!(skip(&buf).unwrap().is_empty());
}

#[test]
fn fixed_array_decode_checks_the_size() {
    let mut buf = Vec::new();
    append_array_header(&mut buf, 3);
    for v in [1u64, 2, 3] {
        append_u64(&mut buf, v);
    }
    assert_eq!(buf, [0x93, 0x01, 0x02, 0x03]);

    let mut rest = read_sized_array_header(&buf, 3).unwrap();
    for want in [1u64, 2, 3] {
        let (got, r) = read_u64(rest).unwrap();
        assert_eq!(got, want);
        rest = r;
    }
    assert!(rest.is_empty());

    assert!(matches!(
        read_sized_array_header(&buf, 4),
        Err(Error::ArraySize { wanted: 4, got: 3 })
    ));
}

#[test]
fn integer_boundaries_round_trip_at_expected_widths() {
    // (value, encoded length through the signed writer)
    let signed: &[(i64, usize)] = &[
        (0, 1),
        (127, 1),
        (128, 3),
        (255, 3),
        (256, 3),
        (32767, 3),
        (32768, 5),
        ((1 << 31) - 1, 5),
        (1 << 31, 9),
        (i64::MAX, 9),
        (-32, 1),
        (-33, 2),
        (-128, 2),
        (i64::MIN, 9),
    ];
    for &(v, len) in signed {
        let mut buf = Vec::new();
        append_i64(&mut buf, v);
        assert_eq!(buf.len(), len, "encoded width of {v}");
        let (out, rest) = read_i64(&buf).unwrap();
        assert_eq!(out, v);
        assert!(rest.is_empty(), "decode of {v} must consume exactly its bytes");
    }

    let unsigned: &[(u64, usize)] = &[
        (0, 1),
        (127, 1),
        (128, 2),
        (255, 2),
        (256, 3),
        (65535, 3),
        (65536, 5),
        (u64::from(u32::MAX), 5),
        (u64::from(u32::MAX) + 1, 9),
        (u64::MAX, 9),
    ];
    for &(v, len) in unsigned {
        let mut buf = Vec::new();
        append_u64(&mut buf, v);
        assert_eq!(buf.len(), len, "encoded width of {v}");
        let (out, rest) = read_u64(&buf).unwrap();
        assert_eq!(out, v);
        assert!(rest.is_empty());
    }
}

#[test]
fn string_width_boundaries() {
    for (len, lead) in [
        (0usize, 0xa0u8),
        (31, 0xbf),
        (32, 0xd9),
        (255, 0xd9),
        (256, 0xda),
        (65535, 0xda),
        (65536, 0xdb),
    ] {
        let s = "x".repeat(len);
        let mut buf = Vec::new();
        append_str(&mut buf, &s);
        assert_eq!(buf[0], lead, "lead byte for str of length {len}");
        let (out, rest) = read_str(&buf).unwrap();
        assert_eq!(out.len(), len);
        assert!(rest.is_empty());
    }
}

#[test]
fn bin_width_boundaries() {
    for (len, lead) in [
        (0usize, 0xc4u8),
        (255, 0xc4),
        (256, 0xc5),
        (65535, 0xc5),
        (65536, 0xc6),
    ] {
        let data = vec![0xabu8; len];
        let mut buf = Vec::new();
        append_bin(&mut buf, &data);
        assert_eq!(buf[0], lead, "lead byte for bin of length {len}");
        let (out, rest) = read_bin(&buf).unwrap();
        assert_eq!(out.len(), len);
        assert!(rest.is_empty());
    }
}

#[test]
fn collection_header_boundaries() {
    for (len, lead) in [(0u32, 0x90u8), (15, 0x9f), (16, 0xdc), (65535, 0xdc), (65536, 0xdd)] {
        let mut buf = Vec::new();
        append_array_header(&mut buf, len);
        assert_eq!(buf[0], lead);
        assert_eq!(read_array_header(&buf).unwrap().0, len);
    }
    for (len, lead) in [(0u32, 0x80u8), (15, 0x8f), (16, 0xde), (65535, 0xde), (65536, 0xdf)] {
        let mut buf = Vec::new();
        append_map_header(&mut buf, len);
        assert_eq!(buf[0], lead);
        assert_eq!(read_map_header(&buf).unwrap().0, len);
    }
}

#[test]
fn zero_length_objects_decode_clean() {
    let mut buf = Vec::new();
    append_str(&mut buf, "");
    append_bin(&mut buf, &[]);
    append_array_header(&mut buf, 0);
    append_map_header(&mut buf, 0);

    let (s, rest) = read_str(&buf).unwrap();
    assert_eq!(s, "");
    let (b, rest) = read_bin(rest).unwrap();
    assert!(b.is_empty());
    let (n, rest) = read_array_header(rest).unwrap();
    assert_eq!(n, 0);
    let (n, rest) = read_map_header(rest).unwrap();
    assert_eq!(n, 0);
    assert!(rest.is_empty());
}

#[test]
fn skip_consumes_a_concatenation_exactly() {
    let mut buf = Vec::new();
    let mut offsets = Vec::new();
    for i in 0..20i64 {
        offsets.push(buf.len());
        match i % 5 {
            0 => append_i64(&mut buf, i * 1000),
            1 => append_str(&mut buf, &"s".repeat(i as usize * 7)),
            2 => {
                append_array_header(&mut buf, 2);
                append_bool(&mut buf, true);
                append_nil(&mut buf);
            }
            3 => {
                append_map_header(&mut buf, 1);
                append_str(&mut buf, "k");
                append_bin(&mut buf, &vec![7u8; i as usize]);
            }
            _ => append_u64(&mut buf, u64::MAX),
        }
    }

    let mut rest: &[u8] = &buf;
    for (n, offset) in offsets.iter().enumerate() {
        assert_eq!(buf.len() - rest.len(), *offset, "start of object {n}");
        rest = skip(rest).unwrap();
    }
    assert!(rest.is_empty());
}

#[test]
fn every_truncation_of_a_compound_object_is_short() {
    let mut buf = Vec::new();
    append_map_header(&mut buf, 2);
    append_str(&mut buf, "numbers");
    append_array_header(&mut buf, 3);
    append_i64(&mut buf, -40000);
    append_u64(&mut buf, 3_000_000_000);
    append_bool(&mut buf, false);
    append_str(&mut buf, "tail");
    append_bin(&mut buf, b"abcdef");

    for cut in 0..buf.len() {
        let err = read_value(&buf[..cut]).unwrap_err();
        assert!(matches!(err, Error::ShortBytes), "cut at {cut}: {err}");
        let err = skip(&buf[..cut]).unwrap_err();
        assert!(matches!(err, Error::ShortBytes), "skip cut at {cut}: {err}");
    }
    // the whole buffer decodes and skips clean
    assert!(read_value(&buf).unwrap().1.is_empty());
    assert!(skip(&buf).unwrap().is_empty());
}

#[test]
fn the_unassigned_prefix_poisons_the_stream() {
    let err = read_value(&[0xc1]).unwrap_err();
    assert!(matches!(err, Error::InvalidPrefix(0xc1)));
    assert!(!err.is_resumable());
    assert!(matches!(read_nil(&[0xc1]), Err(Error::InvalidPrefix(0xc1))));
    assert!(matches!(read_bool(&[0xc1]), Err(Error::InvalidPrefix(0xc1))));
}

#[test]
fn decode_normalizes_but_preserves_logical_value() {
    // a u16-width encoding of a small value re-encodes tighter
    let wide = [0xcd, 0x00, 0x07];
    let (value, _) = read_value(&wide).unwrap();
    let mut tight = Vec::new();
    mopack::append_value(&mut tight, &value).unwrap();
    assert_eq!(tight, [0x07]);
    let (again, _) = read_value(&tight).unwrap();
    assert_eq!(value, again);
}
