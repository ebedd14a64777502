use bytes::Bytes;
use log::debug;
use ravro_codec::{Api, Native, Schema};
use rayon::prelude::*;

use crate::BatchError;

/// Decode every payload in parallel. All workers share `api`'s codec cache,
/// so the codec for `T` is built at most a handful of times.
///
/// On failure the error with the lowest index is returned.
pub fn decode_batch<T: Native + Default>(
    api: &Api,
    schema: &Schema,
    payloads: &[Bytes],
) -> Result<Vec<T>, BatchError> {
    debug!(
        "decoding {} payloads as {}",
        payloads.len(),
        std::any::type_name::<T>()
    );
    let results: Vec<_> = payloads
        .par_iter()
        .map(|data| api.decode::<T>(schema, data.clone()))
        .collect();
    first_error(results)
}

/// Encode every value in parallel against one shared [`Api`].
pub fn encode_batch<T: Native>(
    api: &Api,
    schema: &Schema,
    values: &[T],
) -> Result<Vec<Bytes>, BatchError> {
    debug!(
        "encoding {} values of {}",
        values.len(),
        std::any::type_name::<T>()
    );
    let results: Vec<_> = values
        .par_iter()
        .map(|value| api.marshal(schema, value))
        .collect();
    first_error(results)
}

fn first_error<T>(
    results: Vec<Result<T, ravro_codec::CodecError>>,
) -> Result<Vec<T>, BatchError> {
    results
        .into_iter()
        .enumerate()
        .map(|(index, result)| result.map_err(|source| BatchError { index, source }))
        .collect()
}
