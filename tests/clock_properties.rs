//! Property tests: random operation sequences against the pool invariants.

use std::collections::{BTreeMap, HashMap, HashSet};

use clockpool::{
    BufferManager, Error, FileId, MemoryStore, PageHandle, PageId, PageStore, PoolDump,
};
use proptest::prelude::*;

const PAGES: u32 = 10;

#[derive(Debug, Clone)]
enum Op {
    Read(usize),
    Alloc,
    Write(usize, u8),
    Release(usize, bool),
    Flush,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<usize>().prop_map(Op::Read),
        1 => Just(Op::Alloc),
        2 => (any::<usize>(), any::<u8>()).prop_map(|(i, b)| Op::Write(i, b)),
        4 => (any::<usize>(), any::<bool>()).prop_map(|(i, d)| Op::Release(i, d)),
        1 => Just(Op::Flush),
    ]
}

/// Number of distinct pages with at least one live handle.
fn pinned_pages(held: &[PageHandle<'_, MemoryStore>]) -> usize {
    held.iter().map(|h| h.page_no()).collect::<HashSet<_>>().len()
}

/// Frame contents and pins, ignoring reference bits.
fn residency(dump: &PoolDump) -> Vec<(Option<FileId>, PageId, bool, bool, u32)> {
    dump.frames
        .iter()
        .map(|f| (f.file, f.page_no, f.valid, f.dirty, f.pin_count))
        .collect()
}

/// Checks that must hold between any two operations.
fn check_pool(
    bpm: &BufferManager<MemoryStore>,
    file: FileId,
    held: &[PageHandle<'_, MemoryStore>],
) -> Result<(), TestCaseError> {
    let mut pins: HashMap<PageId, u32> = HashMap::new();
    for handle in held {
        *pins.entry(handle.page_no()).or_default() += 1;
    }
    for (page_no, count) in &pins {
        // Pinned pages are never evicted
        prop_assert_eq!(bpm.pin_count(file, *page_no), Some(*count));
    }

    let dump = bpm.dump();
    prop_assert_eq!(dump.frames.len(), bpm.pool_size());
    prop_assert_eq!(
        dump.valid_frames,
        dump.frames.iter().filter(|f| f.valid).count()
    );

    let mut identities = HashSet::new();
    for frame in &dump.frames {
        if frame.valid {
            prop_assert!(identities.insert((frame.file, frame.page_no)));
        } else {
            prop_assert_eq!(frame.pin_count, 0);
            prop_assert!(!frame.dirty);
            prop_assert_eq!(frame.file, None);
        }
    }

    let total_pins: u32 = dump.frames.iter().map(|f| f.pin_count).sum();
    prop_assert_eq!(total_pins as usize, held.len());
    Ok(())
}

proptest! {
    #[test]
    fn prop_pool_invariants(
        pool_size in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut store = MemoryStore::new("prop");
        for _ in 0..PAGES {
            store.allocate_page().unwrap();
        }
        let bpm = BufferManager::new(pool_size);
        let file = bpm.add_file(store);

        // Expected first byte of every live page
        let mut model: BTreeMap<PageId, u8> = (0..PAGES).map(|n| (PageId::new(n), 0)).collect();
        let mut held: Vec<PageHandle<'_, MemoryStore>> = Vec::new();

        for op in ops {
            match op {
                Op::Read(i) => {
                    let page_no = *model.keys().nth(i % model.len()).unwrap();
                    let before = residency(&bpm.dump());
                    match bpm.read_page(file, page_no) {
                        Ok(handle) => {
                            prop_assert_eq!(handle.read().as_slice()[0], model[&page_no]);
                            held.push(handle);
                        }
                        Err(Error::BufferExceeded) => {
                            // A failed sweep evicts nothing and leaves pins alone
                            prop_assert!(pinned_pages(&held) > 0);
                            prop_assert_eq!(residency(&bpm.dump()), before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error: {}", e),
                    }
                }
                Op::Alloc => {
                    let before = residency(&bpm.dump());
                    match bpm.alloc_page(file) {
                        Ok(handle) => {
                            prop_assert!(!model.contains_key(&handle.page_no()));
                            prop_assert_eq!(bpm.is_dirty(file, handle.page_no()), Some(false));
                            model.insert(handle.page_no(), 0);
                            held.push(handle);
                        }
                        Err(Error::BufferExceeded) => {
                            prop_assert!(pinned_pages(&held) > 0);
                            prop_assert_eq!(residency(&bpm.dump()), before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error: {}", e),
                    }
                }
                Op::Write(i, byte) => {
                    if !held.is_empty() {
                        let handle = &held[i % held.len()];
                        handle.write().as_mut_slice()[0] = byte;
                        model.insert(handle.page_no(), byte);
                    }
                }
                Op::Release(i, dirty) => {
                    if !held.is_empty() {
                        let handle = held.swap_remove(i % held.len());
                        let page_no = handle.page_no();
                        handle.unpin(dirty).unwrap();
                        if dirty {
                            prop_assert_eq!(bpm.is_dirty(file, page_no), Some(true));
                        }
                    }
                }
                Op::Flush => {
                    let before = bpm.dump();
                    match bpm.flush_file(file) {
                        Ok(()) => {
                            prop_assert!(held.is_empty());
                            prop_assert_eq!(bpm.valid_frame_count(), 0);
                        }
                        Err(Error::PagePinned { .. }) => {
                            prop_assert!(!held.is_empty());
                            prop_assert_eq!(bpm.dump(), before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error: {}", e),
                    }
                }
            }

            check_pool(&bpm, file, &held)?;
        }

        // Everything written is durable once the pool lets go of it
        held.clear();
        let store = bpm.close_file(file).unwrap();
        for (page_no, byte) in &model {
            prop_assert_eq!(store.peek(*page_no).unwrap().as_slice()[0], *byte);
        }
    }
}
