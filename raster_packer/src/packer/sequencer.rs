use crate::error::PackerError;
use crate::model::settings::PageSettings;
use crate::model::{PageId, Preview};

/// A page of the job, open or ended.
#[derive(Debug, Clone)]
pub struct PageEntry {
    id: PageId,
    settings: PageSettings,
    previews: Vec<Preview>,
    rasters: u32,
}

impl PageEntry {
    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    /// Previews in the order they were added; the first one is the surface-contact layer.
    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    /// Rasters started on the page.
    pub fn rasters(&self) -> u32 {
        self.rasters
    }
}

/// Issues page ids and tracks which page of a job is open.
#[derive(Debug)]
pub struct PageSequencer {
    multipage: bool,
    next_id: u32,
    open: Option<PageEntry>,
    ended: Vec<PageEntry>,
}

impl PageSequencer {
    pub fn new(multipage: bool) -> Self {
        Self {
            multipage,
            next_id: 0,
            open: None,
            ended: Vec::new(),
        }
    }

    /// Opens the next page with a snapshot of `settings`.
    pub fn open_page(&mut self, settings: &PageSettings) -> Result<PageId, PackerError> {
        if let Some(page) = &self.open {
            return Err(PackerError::PageNotOpen(page.id));
        }
        if !self.multipage && self.next_id > 0 {
            return Err(PackerError::MultiPageNotSupported);
        }
        let id = PageId(self.next_id);
        if !id.is_valid() {
            return Err(PackerError::Internal("page ids exhausted".to_string()));
        }
        self.next_id += 1;
        self.open = Some(PageEntry {
            id,
            settings: settings.clone(),
            previews: Vec::new(),
            rasters: 0,
        });
        Ok(id)
    }

    /// The open page, if it is `page`.
    pub fn current(&self, page: PageId) -> Result<&PageEntry, PackerError> {
        self.open
            .as_ref()
            .filter(|entry| entry.id == page)
            .ok_or(PackerError::PageNotOpen(page))
    }

    fn current_mut(&mut self, page: PageId) -> Result<&mut PageEntry, PackerError> {
        self.open
            .as_mut()
            .filter(|entry| entry.id == page)
            .ok_or(PackerError::PageNotOpen(page))
    }

    pub fn add_preview(&mut self, page: PageId, preview: &Preview) -> Result<(), PackerError> {
        self.current_mut(page)?.previews.push(preview.clone());
        Ok(())
    }

    /// Counts a raster started on `page` and returns the new count.
    pub fn start_raster(&mut self, page: PageId) -> Result<u32, PackerError> {
        let entry = self.current_mut(page)?;
        entry.rasters += 1;
        Ok(entry.rasters)
    }

    pub fn close_page(&mut self, page: PageId) -> Result<(), PackerError> {
        self.current(page)?;
        if let Some(entry) = self.open.take() {
            self.ended.push(entry);
        }
        Ok(())
    }

    pub fn has_open_page(&self) -> bool {
        self.open.is_some()
    }

    /// Pages opened so far, the open one included.
    pub fn page_count(&self) -> u32 {
        self.next_id
    }

    /// Every page of the job in the order it was opened.
    pub fn pages(&self) -> impl Iterator<Item = &PageEntry> {
        self.ended.iter().chain(self.open.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut pages = PageSequencer::new(true);
        let settings = PageSettings::new();
        for expected in 0..3 {
            let id = pages.open_page(&settings).unwrap();
            assert_eq!(id, PageId(expected));
            assert!(pages.current(id).is_ok());
            pages.close_page(id).unwrap();
            assert!(matches!(pages.current(id), Err(PackerError::PageNotOpen(_))));
        }
        assert_eq!(pages.page_count(), 3);
        assert_eq!(pages.pages().count(), 3);
    }

    #[test]
    fn test_single_page_model() {
        let mut pages = PageSequencer::new(false);
        let id = pages.open_page(&PageSettings::new()).unwrap();
        pages.close_page(id).unwrap();
        assert!(matches!(
            pages.open_page(&PageSettings::new()),
            Err(PackerError::MultiPageNotSupported)
        ));
    }

    #[test]
    fn test_stale_page_is_rejected() {
        let mut pages = PageSequencer::new(true);
        let first = pages.open_page(&PageSettings::new()).unwrap();
        assert!(pages.open_page(&PageSettings::new()).is_err());
        pages.close_page(first).unwrap();
        let second = pages.open_page(&PageSettings::new()).unwrap();
        assert!(pages.start_raster(first).is_err());
        assert!(pages.close_page(first).is_err());
        assert_eq!(pages.start_raster(second).unwrap(), 1);
        assert_eq!(pages.start_raster(second).unwrap(), 2);
    }

    #[test]
    fn test_previews_keep_their_order() {
        let mut pages = PageSequencer::new(true);
        let id = pages.open_page(&PageSettings::new()).unwrap();
        pages.add_preview(id, &Preview::new(vec![1])).unwrap();
        pages.add_preview(id, &Preview::new(vec![2])).unwrap();
        let previews: Vec<&[u8]> = pages
            .current(id)
            .unwrap()
            .previews()
            .iter()
            .map(Preview::data)
            .collect();
        assert_eq!(previews, vec![&[1u8][..], &[2u8][..]]);
    }
}
