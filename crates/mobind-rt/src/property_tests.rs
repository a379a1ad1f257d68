//! Property tests for the boundary codec and the reference table.

use std::sync::Arc;

use proptest::prelude::*;

use crate::handle::{Handle, Side};
use crate::table::{RefObject, RefTable};
use crate::wire::{utf16_to_utf8, utf8_to_utf16, WireReader, WireWriter};

proptest! {
    #[test]
    fn integers_keep_their_value(a in any::<i8>(), b in any::<i16>(), c in any::<i32>(), d in any::<i64>(), e in any::<u64>()) {
        let mut w = WireWriter::new();
        w.write_i8(a);
        w.write_i16(b);
        w.write_i32(c);
        w.write_i64(d);
        w.write_u64(e);
        let bytes = w.into_bytes();
        prop_assert_eq!(bytes.len(), 1 + 2 + 4 + 8 + 8);

        let mut r = WireReader::new(&bytes);
        prop_assert_eq!(r.read_i8().unwrap(), a);
        prop_assert_eq!(r.read_i16().unwrap(), b);
        prop_assert_eq!(r.read_i32().unwrap(), c);
        prop_assert_eq!(r.read_i64().unwrap(), d);
        prop_assert_eq!(r.read_u64().unwrap(), e);
        prop_assert_eq!(r.remaining(), 0);
    }

    // NaN payloads and signed zeros included.
    #[test]
    fn floats_keep_their_bit_pattern(single in any::<u32>(), double in any::<u64>()) {
        let mut w = WireWriter::new();
        w.write_f32(f32::from_bits(single));
        w.write_f64(f64::from_bits(double));
        let bytes = w.into_bytes();

        let mut r = WireReader::new(&bytes);
        prop_assert_eq!(r.read_f32().unwrap().to_bits(), single);
        prop_assert_eq!(r.read_f64().unwrap().to_bits(), double);
    }

    #[test]
    fn text_survives_both_encodings(s in any::<String>()) {
        let units = utf8_to_utf16(&s);
        prop_assert_eq!(utf16_to_utf8(&units).unwrap(), s.clone());

        let mut w = WireWriter::new();
        w.write_utf8(&s).unwrap();
        w.write_utf16(&s).unwrap();
        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        prop_assert_eq!(r.read_utf8().unwrap(), s.clone());
        prop_assert_eq!(r.read_utf16().unwrap(), s);
        prop_assert_eq!(r.remaining(), 0);
    }
}

#[derive(Debug, Clone)]
enum Op {
    Expose,
    Retain(usize),
    Release(usize),
    Reclaim,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::Expose),
        3 => any::<usize>().prop_map(Op::Retain),
        4 => any::<usize>().prop_map(Op::Release),
        1 => Just(Op::Reclaim),
    ]
}

struct Object;

proptest! {
    #[test]
    fn counts_follow_retain_and_release(side in prop_oneof![Just(Side::Exported), Just(Side::Imported)], ops in prop::collection::vec(op(), 1..200)) {
        let table = RefTable::new(side);
        // Expected count per handle, in allocation order.
        let mut model: Vec<(Handle, u32)> = Vec::new();

        for op in ops {
            match op {
                Op::Expose => {
                    let handle = table.expose(RefObject::Opaque(Arc::new(Object)), "Object").unwrap();
                    prop_assert!(model.iter().all(|(h, _)| *h != handle));
                    prop_assert_eq!(handle.side(), Some(side));
                    model.push((handle, 1));
                }
                Op::Retain(i) if !model.is_empty() => {
                    let idx = i % model.len();
                    let (handle, count) = &mut model[idx];
                    let result = table.retain(*handle);
                    if *count == 0 {
                        prop_assert!(result.is_err());
                    } else {
                        *count += 1;
                        prop_assert_eq!(result.unwrap(), *count);
                    }
                }
                Op::Release(i) if !model.is_empty() => {
                    let idx = i % model.len();
                    let (handle, count) = &mut model[idx];
                    let result = table.release(*handle);
                    if *count == 0 {
                        prop_assert!(result.is_err());
                    } else {
                        *count -= 1;
                        prop_assert_eq!(result.unwrap(), *count);
                    }
                }
                Op::Reclaim => {
                    table.reclaim();
                }
                _ => {}
            }
            let live = model.iter().filter(|(_, c)| *c > 0).count();
            prop_assert_eq!(table.live(), live);
        }

        table.reclaim();
        prop_assert_eq!(table.len(), table.live());
        for (handle, count) in &model {
            match table.get(*handle) {
                Ok(entry) => prop_assert_eq!(entry.count(), *count),
                Err(_) => prop_assert_eq!(*count, 0),
            }
        }
    }
}
