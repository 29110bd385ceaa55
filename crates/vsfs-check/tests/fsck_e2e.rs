//! End-to-end check/repair cycles over whole images.

use vsfs_block::{ByteDevice, FileByteDevice, MemByteDevice};
use vsfs_check::{CheckCategory, Inconsistency, run};
use vsfs_ondisk::Inode;
use vsfs_types::{
    BlockNumber, InodeIndex, VSFS_BLOCK_SIZE, VSFS_DATA_BITMAP_BLOCK, VSFS_DATA_BLOCK_START,
    VSFS_INODE_BITMAP_BLOCK, VSFS_INODE_COUNT, VSFS_INODE_SIZE, VSFS_INODE_TABLE_START,
    VSFS_MAGIC, VSFS_TOTAL_BLOCKS, read_le_u32, write_le_u16, write_le_u32,
};

/// Build a fully consistent image: correct superblock, the given inodes,
/// and both bitmaps derived from validity/reachability.
///
/// The closure may also scribble raw block contents (e.g. indirect blocks)
/// before the bitmaps are derived.
fn consistent_image(build: impl FnOnce(&mut Vec<u8>, &mut Vec<Inode>)) -> Vec<u8> {
    let mut image = vec![0u8; (VSFS_TOTAL_BLOCKS * VSFS_BLOCK_SIZE) as usize];
    write_le_u16(&mut image, 0, VSFS_MAGIC);
    write_le_u32(&mut image, 4, VSFS_BLOCK_SIZE);
    write_le_u32(&mut image, 8, VSFS_TOTAL_BLOCKS);
    write_le_u32(&mut image, 12, VSFS_INODE_BITMAP_BLOCK);
    write_le_u32(&mut image, 16, VSFS_DATA_BITMAP_BLOCK);
    write_le_u32(&mut image, 20, VSFS_INODE_TABLE_START);
    write_le_u32(&mut image, 24, VSFS_DATA_BLOCK_START);
    write_le_u32(&mut image, 28, VSFS_INODE_SIZE);
    write_le_u32(&mut image, 32, VSFS_INODE_COUNT);

    let mut inodes = vec![Inode::default(); VSFS_INODE_COUNT as usize];
    build(&mut image, &mut inodes);

    for (idx, inode) in inodes.iter().enumerate() {
        let base =
            (VSFS_INODE_TABLE_START * VSFS_BLOCK_SIZE) as usize + idx * VSFS_INODE_SIZE as usize;
        inode.encode_into(&mut image[base..base + VSFS_INODE_SIZE as usize]);
    }

    let in_range = |block: u32| (VSFS_DATA_BLOCK_START..VSFS_TOTAL_BLOCKS).contains(&block);
    let mut mark_data = |image: &mut Vec<u8>, block: u32| {
        let base = (VSFS_DATA_BITMAP_BLOCK * VSFS_BLOCK_SIZE) as usize;
        let slot = block - VSFS_DATA_BLOCK_START;
        image[base + (slot / 8) as usize] |= 1 << (slot % 8);
    };

    for (idx, inode) in inodes.iter().enumerate() {
        if !inode.is_valid() {
            continue;
        }
        let base = (VSFS_INODE_BITMAP_BLOCK * VSFS_BLOCK_SIZE) as usize;
        image[base + idx / 8] |= 1 << (idx % 8);

        for &ptr in &inode.direct {
            if ptr != 0 && in_range(ptr) {
                mark_data(&mut image, ptr);
            }
        }
        if inode.indirect != 0 && in_range(inode.indirect) {
            mark_data(&mut image, inode.indirect);
            let indirect_base = (inode.indirect * VSFS_BLOCK_SIZE) as usize;
            for entry_idx in 0..(VSFS_BLOCK_SIZE / 4) as usize {
                let entry = read_le_u32(&image, indirect_base + entry_idx * 4).unwrap();
                if entry != 0 && in_range(entry) {
                    mark_data(&mut image, entry);
                }
            }
        }
    }

    image
}

fn live(direct0: u32) -> Inode {
    let mut inode = Inode {
        nlink: 1,
        mode: 0o100644,
        size: VSFS_BLOCK_SIZE,
        blocks: 1,
        ..Inode::default()
    };
    inode.direct[0] = direct0;
    inode
}

#[test]
fn fresh_valid_image_passes_all_five_checks() {
    let image = consistent_image(|image, inodes| {
        inodes[0] = live(9);
        inodes[1] = live(10);
        inodes[1].indirect = 11;
        let base = 11 * VSFS_BLOCK_SIZE as usize;
        write_le_u32(image, base, 12);
    });
    let device = MemByteDevice::new(image);

    let outcome = run(&device).unwrap();
    assert_eq!(outcome.original_errors(), 0);
    assert!(outcome.repair.is_none(), "repair must not run on a clean image");
    assert!(outcome.is_consistent());
    for category in CheckCategory::ALL {
        assert!(outcome.initial.passed(category), "{category} failed");
    }
}

#[test]
fn single_bad_superblock_field_flags_only_that_field() {
    let mut image = consistent_image(|_, inodes| {
        inodes[0] = live(9);
    });
    write_le_u32(&mut image, 28, 512); // inode_size
    let device = MemByteDevice::new(image);

    let outcome = run(&device).unwrap();
    assert_eq!(
        outcome.initial.findings,
        vec![Inconsistency::SuperblockField {
            field: "inode_size",
            expected: VSFS_INODE_SIZE,
            actual: 512,
        }]
    );

    let repair = outcome.repair.as_ref().expect("repair must have run");
    assert_eq!(repair.fixes, 1);
    assert_eq!(repair.recheck.total_errors(), 0);
    assert!(outcome.is_consistent());
}

#[test]
fn bitmaps_match_derived_truth_after_repair() {
    let mut image = consistent_image(|_, inodes| {
        inodes[2] = live(15);
        inodes[3] = live(16);
    });
    // Corrupt both bitmaps: clear inode 2's bit, set stale inode 40's bit;
    // clear block 15's bit, set unreferenced block 50's bit.
    let inode_bm = (VSFS_INODE_BITMAP_BLOCK * VSFS_BLOCK_SIZE) as usize;
    image[inode_bm] &= !(1 << 2);
    image[inode_bm + 5] |= 1; // inode 40
    let data_bm = (VSFS_DATA_BITMAP_BLOCK * VSFS_BLOCK_SIZE) as usize;
    image[data_bm] &= !(1 << (15 - VSFS_DATA_BLOCK_START));
    image[data_bm + 5] |= 1 << 2; // slot 42 -> block 50
    let device = MemByteDevice::new(image);

    let outcome = run(&device).unwrap();
    assert_eq!(outcome.original_errors(), 4);
    let repair = outcome.repair.as_ref().expect("repair must have run");
    assert_eq!(repair.fixes, 4);
    assert!(outcome.is_consistent());

    // Post-repair image: every bitmap bit equals the derived fact.
    let image = device.into_inner();
    let inode_bm = &image[inode_bm..inode_bm + 10];
    assert_eq!(inode_bm[0], (1 << 2) | (1 << 3));
    assert_eq!(inode_bm[5], 0);
    let data_bm = (VSFS_DATA_BITMAP_BLOCK * VSFS_BLOCK_SIZE) as usize;
    assert!(image[data_bm] & (1 << (15 - VSFS_DATA_BLOCK_START)) != 0);
    assert_eq!(image[data_bm + 5], 0);
}

#[test]
fn duplicate_block_reported_and_not_resolved_by_repair() {
    let image = consistent_image(|_, inodes| {
        inodes[3] = live(20);
        inodes[7] = live(20);
    });
    let device = MemByteDevice::new(image);

    let outcome = run(&device).unwrap();
    let expected = Inconsistency::DuplicateReferences {
        block: BlockNumber(20),
        owners: vec![InodeIndex(3), InodeIndex(7)],
    };
    assert_eq!(outcome.initial.findings, vec![expected.clone()]);
    assert_eq!(expected.to_string(), "block 20 is referenced by multiple inodes: 3 7");

    // Repair restores bitmap consistency only; the duplicate survives the
    // re-check unchanged and the cycle ends in manual-intervention state.
    let repair = outcome.repair.as_ref().expect("repair must have run");
    assert_eq!(repair.fixes, 0);
    assert_eq!(repair.recheck.findings, vec![expected]);
    assert!(!outcome.is_consistent());
}

#[test]
fn bad_direct_pointer_flagged_and_zeroed() {
    let image = consistent_image(|_, inodes| {
        inodes[5] = live(2); // below first data block
    });
    let device = MemByteDevice::new(image);

    let outcome = run(&device).unwrap();
    assert_eq!(
        outcome.initial.findings,
        vec![Inconsistency::BadDirectPointer {
            inode: InodeIndex(5),
            slot: 0,
            value: 2,
        }]
    );
    let repair = outcome.repair.as_ref().expect("repair must have run");
    assert_eq!(repair.fixes, 1);
    assert!(outcome.is_consistent());

    // The pointer reads 0 from the persisted image.
    let image = device.into_inner();
    let record = (VSFS_INODE_TABLE_START * VSFS_BLOCK_SIZE) as usize
        + 5 * VSFS_INODE_SIZE as usize;
    assert_eq!(read_le_u32(&image, record + 40).unwrap(), 0);
}

#[test]
fn bad_indirect_entries_are_zeroed_in_place() {
    let image = consistent_image(|image, inodes| {
        inodes[1] = live(9);
        inodes[1].indirect = 10;
        let base = 10 * VSFS_BLOCK_SIZE as usize;
        write_le_u32(image, base, 12); // fine
        write_le_u32(image, base + 4, 3); // below range
        write_le_u32(image, base + 8, 90); // above range
    });
    let device = MemByteDevice::new(image);

    let outcome = run(&device).unwrap();
    assert_eq!(outcome.initial.count(CheckCategory::BadBlocks), 2);
    let repair = outcome.repair.as_ref().expect("repair must have run");
    assert_eq!(repair.fixes, 2);
    assert!(outcome.is_consistent());

    let image = device.into_inner();
    let base = 10 * VSFS_BLOCK_SIZE as usize;
    assert_eq!(read_le_u32(&image, base).unwrap(), 12);
    assert_eq!(read_le_u32(&image, base + 4).unwrap(), 0);
    assert_eq!(read_le_u32(&image, base + 8).unwrap(), 0);
}

#[test]
fn repair_is_idempotent() {
    let mut image = consistent_image(|_, inodes| {
        inodes[0] = live(9);
        inodes[4] = live(33);
    });
    // Pile up unrelated corruption: bad magic, stale bitmap bit, bad pointer.
    write_le_u16(&mut image, 0, 0x0000);
    let data_bm = (VSFS_DATA_BITMAP_BLOCK * VSFS_BLOCK_SIZE) as usize;
    image[data_bm + 6] |= 1 << 7; // slot 55 -> block 63
    let record = (VSFS_INODE_TABLE_START * VSFS_BLOCK_SIZE) as usize
        + 4 * VSFS_INODE_SIZE as usize;
    write_le_u32(&mut image, record + 44, 64); // direct slot 1 out of range
    let device = MemByteDevice::new(image);

    let outcome = run(&device).unwrap();
    assert!(outcome.original_errors() > 0);
    assert!(outcome.is_consistent());

    // A second full cycle over the repaired image finds nothing.
    let second = run(&device).unwrap();
    assert_eq!(second.original_errors(), 0);
    assert!(second.repair.is_none());
}

#[test]
fn reserved_bytes_survive_a_repair_cycle() {
    let mut image = consistent_image(|_, inodes| {
        inodes[0] = live(9);
    });
    image[2] = 0x5A; // superblock alignment padding
    image[1000] = 0xC3; // superblock reserved tail
    let record = (VSFS_INODE_TABLE_START * VSFS_BLOCK_SIZE) as usize;
    image[record + 128] = 0x7E; // inode 0 reserved tail
    write_le_u32(&mut image, 4, 8192); // force a repair
    let device = MemByteDevice::new(image);

    let outcome = run(&device).unwrap();
    assert!(outcome.is_consistent());

    let image = device.into_inner();
    assert_eq!(image[2], 0x5A);
    assert_eq!(image[1000], 0xC3);
    assert_eq!(image[record + 128], 0x7E);
}

#[test]
fn file_backed_image_repairs_in_place() {
    use std::io::Write;

    let mut image = consistent_image(|_, inodes| {
        inodes[1] = live(14);
    });
    write_le_u32(&mut image, 24, 9); // corrupt data_block_start

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&image).unwrap();
    tmp.flush().unwrap();

    let device = FileByteDevice::open_rw(tmp.path()).unwrap();
    let outcome = run(&device).unwrap();
    assert!(outcome.original_errors() > 0);
    assert!(outcome.is_consistent());

    // Reopen and verify the persisted geometry.
    let device = FileByteDevice::open_rw(tmp.path()).unwrap();
    let mut field = [0u8; 4];
    device.read_exact_at(24, &mut field).unwrap();
    assert_eq!(u32::from_le_bytes(field), VSFS_DATA_BLOCK_START);
}
