//! Owned addrinfo chains: conversion between layouts and release of converted lists.
//!
//! Every record reachable from an [`AddrInfoList`], and every address and canonical name buffer
//! those records point at, is allocated by this module. The head record is held by value so it
//! can be handed to a caller who owns the storage for it; records 2..N form an [`OwnedTail`].
//!
//! Input chains are trusted: they must be finite and acyclic, and each `addr` buffer must be
//! `addrlen` bytes. Nothing here detects a cycle.
use crate::{AddrInfo, AddrInfoLayout, FromInner, RecordFields};
use crate::{SockAddrBridge, SockAddrBuf};
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr;

/// A record that owns its address and canonical name buffers, but not its successor.
struct OwnedRecord<R: AddrInfoLayout>(R);

impl<R: AddrInfoLayout> OwnedRecord<R> {
    fn new(fields: RecordFields) -> OwnedRecord<R> {
        let mut record = R::empty();
        record.set_fields(fields);
        OwnedRecord(record)
    }

    fn set_canonname(&mut self, name: CString) {
        self.0.set_canonname(name.into_raw());
    }

    /// The buffer length must equal the record's addrlen.
    fn set_addr(&mut self, addr: SockAddrBuf) {
        debug_assert_eq!(addr.len(), self.0.fields().addrlen as usize);
        self.0.set_addr(addr.into_raw());
    }

    fn into_inner(self) -> R {
        let record = ManuallyDrop::new(self);
        unsafe { ptr::read(&record.0) }
    }
}

impl<R: AddrInfoLayout> Drop for OwnedRecord<R> {
    fn drop(&mut self) {
        unsafe { free_buffers(&mut self.0) }
    }
}

/// Frees the address and canonical name buffers of `record`.
unsafe fn free_buffers<R: AddrInfoLayout>(record: &mut R) {
    let addr = record.addr();
    if !addr.is_null() {
        drop(SockAddrBuf::from_raw(addr, record.fields().addrlen as usize));
        record.set_addr(ptr::null_mut());
    }
    let name = record.canonname();
    if !name.is_null() {
        drop(CString::from_raw(name));
        record.set_canonname(ptr::null_mut());
    }
}

/// Frees `node` and every record after it, returning how many records were freed.
unsafe fn free_chain<R: AddrInfoLayout>(mut node: *mut R) -> usize {
    let mut count = 0;
    while !node.is_null() {
        let record = Box::from_raw(node);
        node = record.next();
        drop(OwnedRecord(*record));
        count += 1;
    }
    count
}

/// Records 2..N of a converted chain. Each record is individually heap allocated and is freed,
/// along with its buffers, when the tail is dropped.
pub struct OwnedTail<R: AddrInfoLayout> {
    first: *mut R,
}

impl<R: AddrInfoLayout> OwnedTail<R> {
    fn empty() -> OwnedTail<R> {
        OwnedTail {
            first: ptr::null_mut(),
        }
    }

    /// Takes back ownership of the tail of a chain that was given away by
    /// [`AddrInfoList::into_head()`].
    ///
    /// # Safety
    ///
    /// `head` must come from into_head() and its tail must not have been reclaimed before.
    pub unsafe fn from_head(head: &R) -> OwnedTail<R> {
        OwnedTail { first: head.next() }
    }

    /// Frees every record in the tail, returning how many were freed.
    pub fn release(self) -> usize {
        let first = ManuallyDrop::new(self).first;
        unsafe { free_chain(first) }
    }
}

impl<R: AddrInfoLayout> Drop for OwnedTail<R> {
    fn drop(&mut self) {
        unsafe { free_chain(self.first) };
    }
}

/// An addrinfo chain in layout `R`, owned entirely by this value.
///
/// Dropping the list frees the head's buffers and every tail record. [`into_head()`] instead
/// gives the head away; the tail then has to be freed with [`release()`].
///
/// [`into_head()`]: AddrInfoList::into_head
pub struct AddrInfoList<R: AddrInfoLayout> {
    head: OwnedRecord<R>,
    tail: OwnedTail<R>,
}

unsafe impl<R: AddrInfoLayout> Send for AddrInfoList<R> {}

impl<R: AddrInfoLayout> AddrInfoList<R> {
    /// Builds a single record list from `info`, e.g. lookup hints.
    pub fn new(info: &AddrInfo) -> crate::Result<AddrInfoList<R>> {
        Ok(ListBuilder::new(record_from_info(info)?).finish())
    }

    /// Builds a list holding one record per element of `infos`. Returns None if `infos` is empty.
    pub fn from_infos(infos: &[AddrInfo]) -> crate::Result<Option<AddrInfoList<R>>> {
        let (first, rest) = match infos.split_first() {
            Some(split) => split,
            None => return Ok(None),
        };
        let mut builder = ListBuilder::new(record_from_info(first)?);
        for info in rest {
            builder.push(record_from_info(info)?);
        }
        Ok(Some(builder.finish()))
    }

    /// The first record. Its `next` pointer leads through the rest of the list.
    pub fn head(&self) -> &R {
        &self.head.0
    }

    pub fn as_ptr(&self) -> *const R {
        &self.head.0
    }

    /// Number of records, head included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: a list has at least its head.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over the records, head first.
    pub fn iter(&self) -> Iter<'_, R> {
        Iter {
            node: &self.head.0,
            _marker: PhantomData,
        }
    }

    /// Copies every record out as an AddrInfo.
    pub fn infos(&self) -> Vec<AddrInfo> {
        self.iter().map(AddrInfo::from_inner).collect()
    }

    /// Gives the head record away by value.
    ///
    /// The caller becomes responsible for the head's storage, and must free the tail it links to
    /// with [`release()`] exactly once. The head's own address and canonical name buffers are
    /// never freed by [`release()`].
    pub fn into_head(self) -> R {
        let list = ManuallyDrop::new(self);
        unsafe { ptr::read(&list.head.0) }
    }
}

impl<R: AddrInfoLayout> std::fmt::Debug for AddrInfoList<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.infos()).finish()
    }
}

impl<'a, R: AddrInfoLayout> IntoIterator for &'a AddrInfoList<R> {
    type Item = AddrInfoRef<'a, R>;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Iter<'a, R> {
        self.iter()
    }
}

/// Appends records to a list under construction. Dropping the builder frees everything pushed
/// so far, so a failed build never leaves a partially linked list behind.
struct ListBuilder<R: AddrInfoLayout> {
    list: AddrInfoList<R>,
    last: *mut R,
}

impl<R: AddrInfoLayout> ListBuilder<R> {
    fn new(head: OwnedRecord<R>) -> ListBuilder<R> {
        ListBuilder {
            list: AddrInfoList {
                head,
                tail: OwnedTail::empty(),
            },
            last: ptr::null_mut(),
        }
    }

    fn push(&mut self, record: OwnedRecord<R>) {
        let node = Box::into_raw(Box::new(record.into_inner()));
        if self.last.is_null() {
            self.list.head.0.set_next(node);
            self.list.tail.first = node;
        } else {
            unsafe { (*self.last).set_next(node) };
        }
        self.last = node;
    }

    fn finish(self) -> AddrInfoList<R> {
        self.list
    }
}

/// A borrowed record of an [`AddrInfoList`].
pub struct AddrInfoRef<'a, R: AddrInfoLayout> {
    record: &'a R,
}

impl<'a, R: AddrInfoLayout> Clone for AddrInfoRef<'a, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, R: AddrInfoLayout> Copy for AddrInfoRef<'a, R> {}

impl<'a, R: AddrInfoLayout> AddrInfoRef<'a, R> {
    pub fn fields(&self) -> RecordFields {
        self.record.fields()
    }

    /// The socket address bytes, exactly `addrlen` long, or None if the record has no address.
    pub fn address(&self) -> Option<&'a [u8]> {
        let addr = self.record.addr();
        if addr.is_null() {
            return None;
        }
        let len = self.fields().addrlen as usize;
        Some(unsafe { std::slice::from_raw_parts(addr, len) })
    }

    pub fn canonical_name(&self) -> Option<&'a CStr> {
        let name = self.record.canonname();
        if name.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(name) })
    }
}

pub struct Iter<'a, R: AddrInfoLayout> {
    node: *const R,
    _marker: PhantomData<&'a R>,
}

impl<'a, R: AddrInfoLayout> Iterator for Iter<'a, R> {
    type Item = AddrInfoRef<'a, R>;

    fn next(&mut self) -> Option<AddrInfoRef<'a, R>> {
        let record: &'a R = unsafe { self.node.as_ref() }?;
        self.node = record.next();
        Some(AddrInfoRef { record })
    }
}

impl<'a, R: AddrInfoLayout> std::iter::FusedIterator for Iter<'a, R> {}

fn record_from_info<R: AddrInfoLayout>(info: &AddrInfo) -> crate::Result<OwnedRecord<R>> {
    let addr = info.addr.as_ref().map(R::encode_addr).transpose()?;
    let mut record = OwnedRecord::new(RecordFields {
        flags: info.flags.bits(),
        family: info.family,
        socktype: info.socktype,
        protocol: info.protocol,
        addrlen: addr.as_ref().map_or(0, |addr| addr.len() as u32),
    });
    if let Some(name) = &info.canonical_name {
        record.set_canonname(CString::new(name.as_str())?);
    }
    if let Some(addr) = addr {
        record.set_addr(addr);
    }
    Ok(record)
}

/// Converts a single record into the peer layout, without its successor.
unsafe fn convert_record<S, B>(src: &S, bridge: &B) -> crate::Result<OwnedRecord<S::Peer>>
where
    S: AddrInfoLayout,
    B: SockAddrBridge + ?Sized,
{
    let fields = src.fields();
    let mut record = OwnedRecord::new(fields);
    if let Some(name) = src.canonname().as_ref() {
        record.set_canonname(CStr::from_ptr(name).to_owned());
    }
    let addr = src.addr();
    if !addr.is_null() {
        let len = fields.addrlen as usize;
        let mut buf = SockAddrBuf::new(len)?;
        S::bridge_addr(
            bridge,
            std::slice::from_raw_parts(addr, len),
            buf.as_bytes_mut(),
        )?;
        record.set_addr(buf);
    }
    Ok(record)
}

/// Converts the chain starting at `src` into a newly allocated chain in the peer layout.
///
/// Scalar fields are copied verbatim, canonical names are duplicated, and every socket address
/// is translated by `bridge` into a new buffer of exactly `addrlen` bytes. The source chain is
/// not modified. On any failure everything allocated so far is freed and the error is returned.
///
/// # Safety
///
/// `src` must head a finite, acyclic chain whose `next` pointers are null or valid, whose
/// canonical names are null or nul-terminated, and whose `addr` buffers are null or `addrlen`
/// bytes long. A cyclic chain makes this function allocate until memory runs out.
pub unsafe fn convert<S, B>(src: &S, bridge: &B) -> crate::Result<AddrInfoList<S::Peer>>
where
    S: AddrInfoLayout,
    B: SockAddrBridge + ?Sized,
{
    let mut builder = ListBuilder::new(convert_record(src, bridge)?);
    let mut next = src.next();
    while let Some(record) = next.as_ref() {
        builder.push(convert_record(record, bridge)?);
        next = record.next();
    }
    Ok(builder.finish())
}

/// Frees records 2..N of the chain headed by `head`, with their buffers, and returns how many
/// records were freed. The head record and its own buffers are left untouched, including its
/// `next` pointer, which dangles afterwards.
///
/// # Safety
///
/// `head` must be null, or a head obtained from [`AddrInfoList::into_head()`] whose tail has not
/// been released yet. Releasing a chain built any other way (stack allocated or shared records)
/// or releasing the same chain twice is undefined behavior.
pub unsafe fn release<R: AddrInfoLayout>(head: *const R) -> usize {
    match head.as_ref() {
        Some(head) => OwnedTail::from_head(head).release(),
        None => 0,
    }
}
