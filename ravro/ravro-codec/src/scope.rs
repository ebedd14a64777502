use std::{any::TypeId, collections::HashMap, sync::Arc};

use crate::{
    codec::{RecordDecoder, RecordEncoder},
    config::Api,
};

/// Record codecs under construction during one top-level build, keyed by
/// record name and native type.
///
/// A record registers itself before its fields are built, so a reference
/// back to it resolves to the same codec instead of recursing.
pub(crate) struct BuildScope<'a> {
    api: &'a Api,
    decoders: HashMap<(String, TypeId), Arc<RecordDecoder>>,
    encoders: HashMap<(String, TypeId), Arc<RecordEncoder>>,
}

impl<'a> BuildScope<'a> {
    pub(crate) fn new(api: &'a Api) -> Self {
        Self {
            api,
            decoders: HashMap::new(),
            encoders: HashMap::new(),
        }
    }

    pub(crate) fn api(&self) -> &'a Api {
        self.api
    }

    pub(crate) fn seen_decoder(&self, name: &str, type_id: TypeId) -> Option<&Arc<RecordDecoder>> {
        self.decoders.get(&(name.to_owned(), type_id))
    }

    pub(crate) fn add_decoder(&mut self, name: &str, type_id: TypeId, decoder: Arc<RecordDecoder>) {
        self.decoders.insert((name.to_owned(), type_id), decoder);
    }

    pub(crate) fn seen_encoder(&self, name: &str, type_id: TypeId) -> Option<&Arc<RecordEncoder>> {
        self.encoders.get(&(name.to_owned(), type_id))
    }

    pub(crate) fn add_encoder(&mut self, name: &str, type_id: TypeId, encoder: Arc<RecordEncoder>) {
        self.encoders.insert((name.to_owned(), type_id), encoder);
    }
}
