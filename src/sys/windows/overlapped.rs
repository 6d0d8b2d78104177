//! The `OVERLAPPED`-shaped completion token every pending operation carries.
//! Boxed so its address stays stable for the lifetime of the I/O request;
//! the kernel holds a pointer to it for as long as the request is in
//! flight.

use windows_sys::Win32::System::IO::OVERLAPPED;

pub(crate) struct Overlapped(Box<OVERLAPPED>);

impl Overlapped {
    pub(crate) fn new() -> Overlapped {
        Overlapped(Box::new(unsafe { std::mem::zeroed() }))
    }

    pub(crate) fn get(&mut self) -> *mut OVERLAPPED {
        &mut *self.0 as *mut OVERLAPPED
    }
}
