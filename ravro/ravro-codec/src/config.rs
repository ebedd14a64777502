use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use bytes::Bytes;
use log::{debug, trace};
use ravro_core::{CodecError, DEFAULT_MAX_BYTE_SLICE_SIZE, Reader, Schema, Writer};

use crate::{
    cache::CodecCache,
    codec::{self, Decoder, Encoder},
    native::{Descriptor, Native},
    pool::{PooledWriter, WriterPool},
    scope::BuildScope,
};

/// Items written per array or map block unless configured otherwise.
pub const DEFAULT_BLOCK_LENGTH: usize = 100;

/// Items a decoded array or map may grow to unless configured otherwise.
pub const DEFAULT_MAX_SLICE_ALLOC_SIZE: usize = 1 << 24;

/// Codec settings. Freeze into an [`Api`] to use them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Items per written array or map block.
    pub block_length: usize,
    /// Upper bound on a decoded bytes or string length.
    pub max_byte_slice_size: usize,
    /// Upper bound on the items a decoded array or map may grow to.
    pub max_slice_alloc_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_length: DEFAULT_BLOCK_LENGTH,
            max_byte_slice_size: DEFAULT_MAX_BYTE_SLICE_SIZE,
            max_slice_alloc_size: DEFAULT_MAX_SLICE_ALLOC_SIZE,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Freeze the settings into an [`Api`] that owns its own codec cache.
    pub fn freeze(self) -> Api {
        Api(Arc::new(ApiInner {
            config: self,
            decoders: CodecCache::default(),
            encoders: CodecCache::default(),
            writers: WriterPool::default(),
            builds: AtomicUsize::new(0),
        }))
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Items per written block; zero is treated as one.
    pub fn with_block_length(mut self, block_length: usize) -> Self {
        self.config.block_length = block_length.max(1);
        self
    }

    pub fn with_max_byte_slice_size(mut self, limit: usize) -> Self {
        self.config.max_byte_slice_size = limit;
        self
    }

    pub fn with_max_slice_alloc_size(mut self, limit: usize) -> Self {
        self.config.max_slice_alloc_size = limit;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }

    pub fn freeze(self) -> Api {
        self.build().freeze()
    }
}

/// Cache occupancy and build counters of an [`Api`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub decoders: usize,
    pub encoders: usize,
    /// Top-level builds run so far, including ones that lost an insert race.
    pub builds: usize,
    /// Scratch writers currently parked in the pool.
    pub idle_writers: usize,
}

/// Frozen configuration: the settings plus the codec cache and scratch pool
/// built from them. Cloning is cheap and clones share the cache.
#[derive(Clone)]
pub struct Api(Arc<ApiInner>);

struct ApiInner {
    config: Config,
    decoders: CodecCache<dyn Decoder>,
    encoders: CodecCache<dyn Encoder>,
    writers: WriterPool,
    builds: AtomicUsize,
}

impl Default for Api {
    fn default() -> Self {
        Config::default().freeze()
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("config", &self.0.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Api {
    pub fn config(&self) -> &Config {
        &self.0.config
    }

    /// Cached decoder for `schema` into values described by `native`.
    pub fn decoder_of(&self, schema: &Schema, native: Descriptor) -> Arc<dyn Decoder> {
        let key = (schema.cache_fingerprint(), native.type_id);
        if let Some(decoder) = self.0.decoders.get(&key) {
            trace!("decoder cache hit: {} into {}", schema.kind(), native.type_name);
            return decoder;
        }
        debug!("building decoder: {} into {}", schema.kind(), native.type_name);
        self.0.builds.fetch_add(1, Ordering::Relaxed);
        let mut scope = BuildScope::new(self);
        let decoder = codec::decoder_of_type(&mut scope, schema, native);
        self.0.decoders.insert(key, decoder)
    }

    /// Cached encoder for `schema` from values described by `native`.
    pub fn encoder_of(&self, schema: &Schema, native: Descriptor) -> Arc<dyn Encoder> {
        let key = (schema.cache_fingerprint(), native.type_id);
        if let Some(encoder) = self.0.encoders.get(&key) {
            trace!("encoder cache hit: {} from {}", schema.kind(), native.type_name);
            return encoder;
        }
        debug!("building encoder: {} from {}", schema.kind(), native.type_name);
        self.0.builds.fetch_add(1, Ordering::Relaxed);
        let mut scope = BuildScope::new(self);
        let encoder = codec::encoder_of_type(&mut scope, schema, native);
        self.0.encoders.insert(key, encoder)
    }

    /// Decode one value of `schema` from `reader` into `dest`.
    pub fn read_value(
        &self,
        schema: &Schema,
        reader: &mut Reader,
        dest: &mut dyn Native,
    ) -> Result<(), CodecError> {
        let decoder = self.decoder_of(schema, dest.descriptor());
        decoder.decode(dest, reader, self)
    }

    /// Encode `src` as one value of `schema`.
    pub fn write_value(
        &self,
        schema: &Schema,
        writer: &mut Writer,
        src: &dyn Native,
    ) -> Result<(), CodecError> {
        let encoder = self.encoder_of(schema, src.descriptor());
        encoder.encode(src, writer, self)
    }

    pub fn marshal<T: Native>(&self, schema: &Schema, value: &T) -> Result<Bytes, CodecError> {
        let mut writer = self.borrow_writer();
        self.write_value(schema, &mut writer, value)?;
        Ok(writer.to_bytes())
    }

    /// Decode `data` into an existing value, reusing what it already holds.
    pub fn unmarshal<T: Native>(
        &self,
        schema: &Schema,
        data: impl Into<Bytes>,
        dest: &mut T,
    ) -> Result<(), CodecError> {
        let mut reader = self.reader(data);
        self.read_value(schema, &mut reader, dest)
    }

    pub fn decode<T: Native + Default>(
        &self,
        schema: &Schema,
        data: impl Into<Bytes>,
    ) -> Result<T, CodecError> {
        let mut value = T::default();
        self.unmarshal(schema, data, &mut value)?;
        Ok(value)
    }

    /// Reader over `data` with this configuration's limits.
    pub fn reader(&self, data: impl Into<Bytes>) -> Reader {
        Reader::new(data).with_max_byte_slice_size(self.0.config.max_byte_slice_size)
    }

    pub fn borrow_writer(&self) -> PooledWriter<'_> {
        self.0.writers.borrow()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            decoders: self.0.decoders.len(),
            encoders: self.0.encoders.len(),
            builds: self.0.builds.load(Ordering::Relaxed),
            idle_writers: self.0.writers.idle(),
        }
    }
}
