//! Property-based tests for the adapter's data path
//!
//! Uses proptest to verify read/write semantics hold across many random
//! offsets, sizes, and contents

use kvfs::{KvfsBuilder, MemoryStore, Outcome, SimpleFdTable, SyscallVfs};
use proptest::prelude::*;
use std::sync::Arc;

fn adapter() -> Arc<SyscallVfs> {
    KvfsBuilder::new()
        .store(MemoryStore::new())
        .fd_table(Arc::new(SimpleFdTable::default()))
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_write_then_read_round_trips(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        offset in 0u64..2048
    ) {
        let vfs = adapter();
        vfs.write("./db1/t1.frm", &data, offset).unwrap();

        // A fresh entry grows to exactly the write's end position.
        prop_assert_eq!(vfs.size("./db1/t1.frm").unwrap(), offset + data.len() as u64);

        let mut buf = vec![0u8; data.len()];
        let count = vfs.read("./db1/t1.frm", &mut buf, offset).unwrap();
        prop_assert_eq!(count, data.len());
        prop_assert_eq!(&buf, &data);
    }

    #[test]
    fn prop_sparse_gap_is_zero_filled(
        gap in 1u64..2048,
        byte in any::<u8>()
    ) {
        let vfs = adapter();
        vfs.write("./db1/t1.frm", &[byte], gap).unwrap();

        let mut content = vec![0xFFu8; gap as usize + 1];
        let count = vfs.read("./db1/t1.frm", &mut content, 0).unwrap();
        prop_assert_eq!(count, gap as usize + 1);

        prop_assert!(content[..gap as usize].iter().all(|&b| b == 0));
        prop_assert_eq!(content[gap as usize], byte);
    }

    #[test]
    fn prop_overwrite_preserves_outside_window(
        base in prop::collection::vec(any::<u8>(), 16..512),
        patch in prop::collection::vec(any::<u8>(), 1..16),
        offset in 0usize..16
    ) {
        let vfs = adapter();
        vfs.write("./db1/t1.frm", &base, 0).unwrap();
        vfs.write("./db1/t1.frm", &patch, offset as u64).unwrap();

        let end = (offset + patch.len()).max(base.len());
        let mut content = vec![0u8; end];
        let count = vfs.read("./db1/t1.frm", &mut content, 0).unwrap();
        prop_assert_eq!(count, end);

        prop_assert_eq!(&content[..offset], &base[..offset]);
        prop_assert_eq!(&content[offset..offset + patch.len()], &patch[..]);
        if offset + patch.len() < base.len() {
            prop_assert_eq!(&content[offset + patch.len()..], &base[offset + patch.len()..]);
        }
    }

    #[test]
    fn prop_reads_past_end_are_empty(
        data in prop::collection::vec(any::<u8>(), 0..256),
        past in 0u64..128
    ) {
        let vfs = adapter();
        vfs.write("./db1/t1.frm", &data, 0).unwrap();

        let mut buf = [0u8; 32];
        let count = vfs
            .read("./db1/t1.frm", &mut buf, data.len() as u64 + past)
            .unwrap();
        prop_assert_eq!(count, 0);
    }

    #[test]
    fn prop_unlink_always_wins(
        data in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        let vfs = adapter();
        vfs.write("./db1/t1.frm", &data, 0).unwrap();

        prop_assert_eq!(vfs.unlink("./db1/t1.frm").unwrap(), Outcome::Done(()));
        prop_assert!(matches!(
            vfs.stat("./db1/t1.frm").unwrap(),
            Outcome::Fail(_)
        ));
        prop_assert!(matches!(
            vfs.access("./db1/t1.frm").unwrap(),
            Outcome::Fail(_)
        ));
        prop_assert_eq!(vfs.size("./db1/t1.frm").unwrap(), 0);
    }

    #[test]
    fn prop_rename_carries_content_exactly(
        data in prop::collection::vec(any::<u8>(), 1..1024)
    ) {
        let vfs = adapter();
        vfs.write("./db1/a.frm", &data, 0).unwrap();
        vfs.rename("./db1/a.frm", "./db1/b.frm").unwrap();

        prop_assert!(matches!(
            vfs.stat("./db1/a.frm").unwrap(),
            Outcome::Fail(_)
        ));

        let mut content = vec![0u8; data.len()];
        let count = vfs.read("./db1/b.frm", &mut content, 0).unwrap();
        prop_assert_eq!(count, data.len());
        prop_assert_eq!(&content, &data);
    }
}
