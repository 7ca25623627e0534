//! Request and response bodies

pub mod fees;
pub mod reminders;
pub mod notifications;

use serde::Deserialize;

use core_kernel::PageRequest;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// `page` and `page_size` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }
}
