//! The assembled view over one metadata region, and its owned wrapper.
//!
//! [`MetadataView`] borrows a byte region starting at the BSJB root and wires
//! together everything the crate parses out of it: the root header, the five
//! streams, and the member cache. [`Metadata`] is the owning form, pinning the
//! backing bytes (heap buffer or memory map) together with the borrowed view
//! through a self-referencing cell.

use std::path::Path;

use crate::{
    file::File,
    metadata::{
        members::{MemberCache, MemberRc},
        root::Root,
        signatures::SignatureResolver,
        streams::{Blob, Guid, Strings, TablesHeader, UserStrings},
        token::Token,
    },
    Result,
};

/// A parsed metadata region: root, streams, tables and the member cache.
///
/// Construction parses the root header and every present stream eagerly, so
/// an `Ok` view is structurally sound end to end; row decoding stays lazy
/// inside the tables. Missing streams are `None`, not errors — tiny images
/// legitimately omit heaps they never reference.
pub struct MetadataView<'a> {
    root: Root<'a>,
    strings: Option<Strings<'a>>,
    user_strings: Option<UserStrings<'a>>,
    guids: Option<Guid<'a>>,
    blob: Option<Blob<'a>>,
    tables: Option<TablesHeader<'a>>,
    members: MemberCache,
}

impl<'a> MetadataView<'a> {
    /// Parses the metadata region starting at the BSJB signature.
    ///
    /// # Errors
    /// Returns an error if the root header, the stream directory, or any
    /// present stream is malformed or truncated.
    pub fn new(data: &'a [u8]) -> Result<MetadataView<'a>> {
        let root = Root::read(data)?;

        let strings = match root.stream_data("#Strings")? {
            Some(bytes) => Some(Strings::from(bytes)?),
            None => None,
        };
        let user_strings = match root.stream_data("#US")? {
            Some(bytes) => Some(UserStrings::from(bytes)?),
            None => None,
        };
        let guids = match root.stream_data("#GUID")? {
            Some(bytes) => Some(Guid::from(bytes)?),
            None => None,
        };
        let blob = match root.stream_data("#Blob")? {
            Some(bytes) => Some(Blob::from(bytes)?),
            None => None,
        };
        let tables = match root.stream_data("#~")? {
            Some(bytes) => Some(TablesHeader::from(bytes)?),
            None => None,
        };

        Ok(MetadataView {
            root,
            strings,
            user_strings,
            guids,
            blob,
            tables,
            members: MemberCache::new(),
        })
    }

    /// The parsed root header.
    #[must_use]
    pub fn root(&self) -> &Root<'a> {
        &self.root
    }

    /// The `#Strings` heap, if present.
    #[must_use]
    pub fn strings(&self) -> Option<&Strings<'a>> {
        self.strings.as_ref()
    }

    /// The `#US` heap, if present.
    #[must_use]
    pub fn user_strings(&self) -> Option<&UserStrings<'a>> {
        self.user_strings.as_ref()
    }

    /// The `#GUID` heap, if present.
    #[must_use]
    pub fn guids(&self) -> Option<&Guid<'a>> {
        self.guids.as_ref()
    }

    /// The `#Blob` heap, if present.
    #[must_use]
    pub fn blob(&self) -> Option<&Blob<'a>> {
        self.blob.as_ref()
    }

    /// The `#~` tables stream, if present.
    #[must_use]
    pub fn tables(&self) -> Option<&TablesHeader<'a>> {
        self.tables.as_ref()
    }

    /// The member cache scoped to this view.
    #[must_use]
    pub fn members(&self) -> &MemberCache {
        &self.members
    }

    /// Resolves a token through the member cache.
    ///
    /// `None` for the null token, dangling tokens, or when the image has no
    /// tables stream.
    #[must_use]
    pub fn resolve(&self, token: Token) -> Option<MemberRc> {
        let tables = self.tables.as_ref()?;
        self.members.resolve(token, tables)
    }

    /// A signature resolver over this view's tables and blob heap.
    ///
    /// `None` when either stream is absent.
    #[must_use]
    pub fn signature_resolver(&self) -> Option<SignatureResolver<'_>> {
        Some(SignatureResolver::new(
            self.tables.as_ref()?,
            self.blob.as_ref()?,
            &self.members,
        ))
    }
}

#[ouroboros::self_referencing]
struct MetadataInner {
    file: File,
    #[borrows(file)]
    #[covariant]
    view: MetadataView<'this>,
}

/// An owned metadata image and its parsed view, bundled.
///
/// # Examples
///
/// ```rust,no_run
/// use metascope::metadata::view::Metadata;
///
/// # fn example() -> metascope::Result<()> {
/// let metadata = Metadata::from_file(std::path::Path::new("image.bin"))?;
/// println!("version: {}", metadata.view().root().version);
/// # Ok(())
/// # }
/// ```
pub struct Metadata {
    inner: MetadataInner,
}

impl Metadata {
    /// Memory-maps a metadata image from disk and parses it.
    ///
    /// # Errors
    /// Returns I/O errors from mapping and parse errors from
    /// [`MetadataView::new`].
    pub fn from_file(path: &Path) -> Result<Metadata> {
        Metadata::build(File::from_file(path)?)
    }

    /// Takes ownership of an in-memory image and parses it.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer and parse errors
    /// from [`MetadataView::new`].
    pub fn from_vec(data: Vec<u8>) -> Result<Metadata> {
        Metadata::build(File::from_mem(data)?)
    }

    fn build(file: File) -> Result<Metadata> {
        let inner = MetadataInnerTryBuilder {
            file,
            view_builder: |file: &File| MetadataView::new(file.data()),
        }
        .try_build()?;

        Ok(Metadata { inner })
    }

    /// The parsed view borrowing this image's bytes.
    #[must_use]
    pub fn view(&self) -> &MetadataView<'_> {
        self.inner.borrow_view()
    }

    /// The raw bytes of the image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.inner.borrow_file().data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{root::METADATA_MAGIC, tables::TableId};

    /// Root + directory + `#~` and `#Strings` streams.
    fn crafted_image() -> Vec<u8> {
        let mut tables = Vec::new();
        let valid: u64 = 1 << TableId::Module as u8;
        tables.extend_from_slice(&0u32.to_le_bytes());
        tables.extend_from_slice(&[2, 0, 0, 1]);
        tables.extend_from_slice(&valid.to_le_bytes());
        tables.extend_from_slice(&0u64.to_le_bytes());
        tables.extend_from_slice(&1u32.to_le_bytes());
        tables.extend_from_slice(&[0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let strings = b"\0Demo\0";

        // Header is 24 bytes (version "v1" padded to 4), directory entries
        // are 12 + 20 bytes, so content starts at 56.
        let tables_offset = 24 + 12 + 20;
        let strings_offset = tables_offset + tables.len();

        let mut data = Vec::new();
        data.extend_from_slice(&METADATA_MAGIC.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"v1\0\0");
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&(tables_offset as u32).to_le_bytes());
        data.extend_from_slice(&(tables.len() as u32).to_le_bytes());
        data.extend_from_slice(b"#~\0\0");
        data.extend_from_slice(&(strings_offset as u32).to_le_bytes());
        data.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        data.extend_from_slice(b"#Strings\0\0\0\0");
        assert_eq!(data.len(), tables_offset);
        data.extend_from_slice(&tables);
        data.extend_from_slice(strings);
        data
    }

    #[test]
    fn view_wires_present_streams() {
        let image = crafted_image();
        let view = MetadataView::new(&image).unwrap();

        assert_eq!(view.root().version, "v1");
        assert!(view.strings().is_some());
        assert!(view.tables().is_some());
        assert!(view.user_strings().is_none());
        assert!(view.guids().is_none());
        assert!(view.blob().is_none());
        assert!(view.signature_resolver().is_none()); // no #Blob

        assert_eq!(view.strings().unwrap().get(1).unwrap(), "Demo");
        assert_eq!(
            view.tables().unwrap().table_row_count(TableId::Module),
            1
        );
    }

    #[test]
    fn view_resolves_tokens() {
        let image = crafted_image();
        let view = MetadataView::new(&image).unwrap();

        let token = Token::from_table(TableId::Module, 1);
        let member = view.resolve(token).unwrap();
        assert_eq!(member.token, token);
        assert!(view.resolve(Token::from_table(TableId::Module, 2)).is_none());
    }

    #[test]
    fn owned_metadata_parses_and_borrows() {
        let metadata = Metadata::from_vec(crafted_image()).unwrap();
        assert_eq!(metadata.view().root().version, "v1");
        assert_eq!(metadata.data().len(), crafted_image().len());
    }

    #[test]
    fn owned_metadata_rejects_garbage() {
        assert!(Metadata::from_vec(vec![0xFF; 64]).is_err());
        assert!(Metadata::from_vec(Vec::new()).is_err());
    }
}
