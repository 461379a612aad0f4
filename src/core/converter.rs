use std::marker::PhantomData;

use crate::domain::model::{DomainModel, Record};
use crate::domain::ports::Converter;

/// 每筆記錄對應一個領域物件，順序不變
#[derive(Debug)]
pub struct ModelConverter<M> {
    _model: PhantomData<fn() -> M>,
}

impl<M: DomainModel> ModelConverter<M> {
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M: DomainModel> Default for ModelConverter<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: DomainModel> Converter for ModelConverter<M> {
    type Output = M;

    fn convert(&self, records: Vec<Record>) -> Vec<M> {
        records.iter().map(M::from_record).collect()
    }
}
