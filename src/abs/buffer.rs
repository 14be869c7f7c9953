//! GPU buffers.
//!
//! A [`GpuBuffer`] owns one linear block of GPU memory. Data transfers go through the
//! `COPY_WRITE_BUFFER` target so that uploading never disturbs the vertex array or
//! uniform bindings that are currently active.

use std::sync::Arc;

use glow::HasContext;

use crate::{
    abs::RenderContext,
    error::{Error, Result},
};

/// What a buffer is bound as when it is consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
    Storage,
}

impl BufferKind {
    fn target(self) -> u32 {
        match self {
            BufferKind::Vertex => glow::ARRAY_BUFFER,
            BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
            BufferKind::Uniform => glow::UNIFORM_BUFFER,
            BufferKind::Storage => glow::SHADER_STORAGE_BUFFER,
        }
    }
}

/// How often the contents are expected to change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

impl BufferUsage {
    fn gl_enum(self) -> u32 {
        match self {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
        }
    }
}

/// CPU access requested when mapping a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapAccess {
    Read,
    Write,
    ReadWrite,
}

impl MapAccess {
    fn gl_bits(self) -> u32 {
        match self {
            MapAccess::Read => glow::MAP_READ_BIT,
            MapAccess::Write => glow::MAP_WRITE_BIT,
            MapAccess::ReadWrite => glow::MAP_READ_BIT | glow::MAP_WRITE_BIT,
        }
    }
}

/// Checks that `size` bytes starting at `offset` fit in a buffer of `capacity` bytes.
pub fn check_range(offset: usize, size: usize, capacity: usize) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(Error::BufferRange {
            offset,
            size,
            capacity,
        }),
    }
}

/// Converts a byte size to the signed size GL takes. Sizes past `i32::MAX` are rejected as a
/// range error against that limit.
pub fn gl_size(size: usize) -> Result<i32> {
    i32::try_from(size).map_err(|_| Error::BufferRange {
        offset: 0,
        size,
        capacity: i32::MAX as usize,
    })
}

/// One GPU buffer object.
pub struct GpuBuffer {
    gl: Arc<glow::Context>,
    id: glow::Buffer,
    kind: BufferKind,
    usage: BufferUsage,
    size: usize,
    binding: Option<u32>,
}

impl GpuBuffer {
    /// Allocates `size` bytes, uploading `data` if given.
    ///
    /// Uniform and storage buffers are bound to `binding` right away.
    pub fn new(
        ctx: &RenderContext,
        kind: BufferKind,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsage,
        binding: u32,
    ) -> Result<Self> {
        if let Some(data) = data {
            check_range(0, data.len(), size)?;
        }
        let gl_byte_size = gl_size(size)?;

        let gl = ctx.gl();
        let id = unsafe { gl.create_buffer().map_err(Error::Device)? };
        let buffer = Self {
            gl: Arc::clone(gl),
            id,
            kind,
            usage,
            size,
            binding: matches!(kind, BufferKind::Uniform | BufferKind::Storage).then_some(binding),
        };

        unsafe {
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(id));
            gl.buffer_data_size(glow::COPY_WRITE_BUFFER, gl_byte_size, usage.gl_enum());
            if let Some(data) = data {
                gl.buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, 0, data);
            }
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        buffer.bind_base();

        log::trace!("Created {kind:?} buffer of {size} bytes");
        Ok(buffer)
    }

    /// Allocates a buffer sized and filled from `data`.
    pub fn with_data(
        ctx: &RenderContext,
        kind: BufferKind,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<Self> {
        Self::new(ctx, kind, data.len(), Some(data), usage, 0)
    }

    fn bind_base(&self) {
        if let Some(binding) = self.binding {
            unsafe {
                self.gl
                    .bind_buffer_base(self.kind.target(), binding, Some(self.id));
            }
        }
    }

    /// Writes `data` at `offset`. The range must lie inside the current capacity.
    pub fn update(&mut self, data: &[u8], offset: usize) -> Result<()> {
        check_range(offset, data.len(), self.size)?;
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(self.id));
            self.gl
                .buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, offset as i32, data);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        Ok(())
    }

    /// Reallocates the storage to exactly `data.len()` bytes and uploads `data`. The handle is
    /// kept, so existing vertex array bindings stay valid.
    pub fn reallocate(&mut self, data: &[u8]) -> Result<()> {
        gl_size(data.len())?;
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(self.id));
            self.gl
                .buffer_data_u8_slice(glow::COPY_WRITE_BUFFER, data, self.usage.gl_enum());
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        self.size = data.len();
        self.bind_base();
        Ok(())
    }

    /// Copies `out.len()` bytes starting at `offset` back to the CPU.
    pub fn read(&self, out: &mut [u8], offset: usize) -> Result<()> {
        check_range(offset, out.len(), self.size)?;
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(self.id));
            self.gl
                .get_buffer_sub_data(glow::COPY_WRITE_BUFFER, offset as i32, out);
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        Ok(())
    }

    /// Maps the whole buffer into client memory. The mapping is released when the returned
    /// guard is dropped.
    pub fn map(&mut self, access: MapAccess) -> Result<BufferMapping<'_>> {
        let ptr = unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(self.id));
            let ptr = self.gl.map_buffer_range(
                glow::COPY_WRITE_BUFFER,
                0,
                self.size as i32,
                access.gl_bits(),
            );
            if ptr.is_null() {
                self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            }
            ptr
        };
        if ptr.is_null() {
            return Err(Error::BufferMap(self.size));
        }
        Ok(BufferMapping {
            buffer: self,
            ptr,
            access,
        })
    }

    /// Re-binds a uniform or storage buffer to its binding point.
    pub fn bind(&self) {
        if self.binding.is_some() {
            self.bind_base();
        } else {
            unsafe {
                self.gl.bind_buffer(self.kind.target(), Some(self.id));
            }
        }
    }

    pub fn id(&self) -> glow::Buffer {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.id);
        }
    }
}

/// A live mapping of a [`GpuBuffer`]. Unmaps on drop.
pub struct BufferMapping<'a> {
    buffer: &'a mut GpuBuffer,
    ptr: *mut u8,
    access: MapAccess,
}

impl BufferMapping<'_> {
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.buffer.size) }
    }

    /// Mutable view of the mapped bytes. Empty for read-only mappings.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        if self.access == MapAccess::Read {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.buffer.size) }
    }
}

impl Drop for BufferMapping<'_> {
    fn drop(&mut self) {
        unsafe {
            self.buffer.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(self.buffer.id));
            self.buffer.gl.unmap_buffer(glow::COPY_WRITE_BUFFER);
            self.buffer.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_inside_capacity_are_accepted() {
        assert!(check_range(0, 16, 16).is_ok());
        assert!(check_range(8, 8, 16).is_ok());
        assert!(check_range(16, 0, 16).is_ok());
    }

    #[test]
    fn ranges_past_capacity_are_rejected() {
        assert!(matches!(
            check_range(8, 9, 16),
            Err(Error::BufferRange {
                offset: 8,
                size: 9,
                capacity: 16
            })
        ));
        assert!(check_range(usize::MAX, 2, 16).is_err());
    }

    #[test]
    fn sizes_past_the_gl_limit_are_rejected() {
        assert_eq!(gl_size(0).unwrap(), 0);
        assert_eq!(gl_size(i32::MAX as usize).unwrap(), i32::MAX);
        assert!(matches!(
            gl_size(i32::MAX as usize + 1),
            Err(Error::BufferRange { offset: 0, .. })
        ));
    }

    #[test]
    fn kinds_map_to_targets() {
        assert_eq!(BufferKind::Index.target(), glow::ELEMENT_ARRAY_BUFFER);
        assert_eq!(BufferKind::Storage.target(), glow::SHADER_STORAGE_BUFFER);
        assert_eq!(
            MapAccess::ReadWrite.gl_bits(),
            glow::MAP_READ_BIT | glow::MAP_WRITE_BIT
        );
    }
}
