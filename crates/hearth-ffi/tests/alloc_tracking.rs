//! Verifies the release protocol with a counting allocator: one release call
//! must return every byte the boundary handed out. Lives in its own test
//! binary so nothing else allocates while we measure.

use std::alloc::{GlobalAlloc, Layout, System};
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr::null_mut;
use std::sync::atomic::{AtomicIsize, Ordering};

use tempfile::TempDir;

use hearth_ffi::*;

static OUTSTANDING: AtomicIsize = AtomicIsize::new(0);

struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            OUTSTANDING.fetch_add(layout.size() as isize, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            OUTSTANDING.fetch_add(layout.size() as isize, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        OUTSTANDING.fetch_sub(layout.size() as isize, Ordering::SeqCst);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            OUTSTANDING.fetch_add(new_size as isize - layout.size() as isize, Ordering::SeqCst);
        }
        new_ptr
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

fn outstanding() -> isize {
    OUTSTANDING.load(Ordering::SeqCst)
}

#[test]
fn release_returns_every_boundary_allocation() {
    let dir = TempDir::new().unwrap();
    let path = CString::new(dir.path().join("cache.db").to_str().unwrap()).unwrap();
    let mut engine: *mut HearthEngine = null_mut();
    assert_eq!(unsafe { hearth_open(path.as_ptr(), &mut engine) }, HEARTH_OK);
    assert_eq!(unsafe { hearth_create_schema(engine) }, HEARTH_OK);

    let body = CString::new("measured message").unwrap();
    let img = CString::new("img/a.png").unwrap();
    let thumb = CString::new("img/a.thumb.png").unwrap();
    let vid = CString::new("vid/b.mp4").unwrap();

    let mut group_items = [
        HearthMediaItem {
            kind: HearthMediaKind::Image,
            path: img.as_ptr() as *mut c_char,
            preview: thumb.as_ptr() as *mut c_char,
            coordinates: HearthMediaCoordinates {
                x: 0,
                y: 0,
                span_x: 255,
                span_y: 128,
            },
        },
        HearthMediaItem {
            kind: HearthMediaKind::Video,
            path: vid.as_ptr() as *mut c_char,
            preview: null_mut(),
            coordinates: HearthMediaCoordinates {
                x: 0,
                y: 128,
                span_x: 255,
                span_y: 127,
            },
        },
    ];

    let batch = [
        HearthMessage {
            id: 1,
            flags: 1,
            text: body.as_ptr() as *mut c_char,
            media: HearthMediaPayload {
                tag: HearthMediaTag::None,
                len: 0,
                items: null_mut(),
            },
            sender: 7,
            channel: 5,
            sent_at_secs: 100,
            sent_at_nanos: 0,
            reply_id: 0,
        },
        HearthMessage {
            id: 2,
            flags: 1 << 9,
            text: null_mut(),
            media: HearthMediaPayload {
                tag: HearthMediaTag::Group,
                len: group_items.len(),
                items: group_items.as_mut_ptr(),
            },
            sender: 7,
            channel: 5,
            sent_at_secs: 200,
            sent_at_nanos: 0,
            reply_id: 1,
        },
    ];
    assert_eq!(
        unsafe { hearth_insert_messages(engine, batch.as_ptr(), batch.len()) },
        HEARTH_OK
    );

    // Warm every reader connection's statement cache so the measured pass
    // allocates only what the boundary hands out.
    for _ in 0..8 {
        let warm = unsafe { hearth_get_messages(engine, 5, 16) };
        assert_eq!(warm.count, 2);
        unsafe { hearth_messages_free(warm) };
    }

    let before = outstanding();
    let array = unsafe { hearth_get_messages(engine, 5, 16) };
    assert_eq!(array.count, 2);
    unsafe { hearth_messages_free(array) };
    assert_eq!(outstanding(), before);

    // Releasing an absent result neither allocates nor frees.
    let before = outstanding();
    unsafe {
        hearth_messages_free(HearthMessageArray {
            count: i64::from(HEARTH_ERR_NETWORK),
            capacity: 0,
            data: null_mut(),
        });
    }
    assert_eq!(outstanding(), before);

    unsafe { hearth_close(engine) };
}
