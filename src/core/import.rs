use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::core::factory::{ImportFactory, SourceSpec};
use crate::core::processor::DataProcessor;
use crate::domain::constraints::ConstraintSet;
use crate::domain::model::{Car, Domain, DomainModel, Entity, Liability, Record};
use crate::utils::error::Result;

/// 一次匯入的結果，序列化為 `{"all_<entity>": [...]}`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub entity: Entity,
    pub records: Vec<Record>,
}

impl Serialize for ImportOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.entity.response_key(), &self.records)?;
        map.end()
    }
}

/// 依實體選擇領域模型並執行完整匯入
pub fn import_entity(
    entity: Entity,
    source: SourceSpec,
    constraints: ConstraintSet,
) -> Result<ImportOutcome> {
    tracing::info!(
        "📥 Importing {} from {} ({})",
        entity.response_key(),
        source.path().display(),
        source.format()
    );

    let records = match entity.domain() {
        Domain::Car => run::<Car>(source, constraints)?,
        Domain::Liability => run::<Liability>(source, constraints)?,
    };

    Ok(ImportOutcome { entity, records })
}

fn run<M: DomainModel>(source: SourceSpec, constraints: ConstraintSet) -> Result<Vec<Record>> {
    let factory = ImportFactory::<M>::new(source, constraints)?;
    let mut processor = DataProcessor::new(&factory);
    let objects = processor.process()?;
    Ok(objects.iter().map(DomainModel::as_record).collect())
}
