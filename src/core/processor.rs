use std::fmt;
use std::time::Instant;

use crate::domain::model::DomainModel;
use crate::domain::ports::{Converter, DataFactory, DataLoader, Validator};
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Loading,
    Validating,
    Converting,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Loading => "loading",
            ImportStage::Validating => "validating",
            ImportStage::Converting => "converting",
        };
        f.write_str(name)
    }
}

/// 單次匯入的狀態；只能往前推進
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Loading,
    Validating,
    Converting,
    Done,
    Failed { stage: ImportStage, reason: String },
}

impl ImportState {
    fn rank(&self) -> u8 {
        match self {
            ImportState::Idle => 0,
            ImportState::Loading => 1,
            ImportState::Validating => 2,
            ImportState::Converting => 3,
            ImportState::Done | ImportState::Failed { .. } => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportState::Done | ImportState::Failed { .. })
    }
}

/// 依序執行 load -> validate -> convert；任何階段的錯誤原樣往上拋
pub struct DataProcessor<M: DomainModel> {
    data_loader: Box<dyn DataLoader>,
    validator: Box<dyn Validator>,
    converter: Box<dyn Converter<Output = M>>,
    state: ImportState,
}

impl<M: DomainModel> DataProcessor<M> {
    pub fn new<F: DataFactory<Model = M>>(factory: &F) -> Self {
        Self {
            data_loader: factory.create_data_loader(),
            validator: factory.create_validator(),
            converter: factory.create_converter(),
            state: ImportState::Idle,
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    fn enter(&mut self, next: ImportState) {
        debug_assert!(
            next.rank() > self.state.rank(),
            "illegal import transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    fn fail(&mut self, stage: ImportStage, reason: String) {
        tracing::warn!("❌ Import failed while {}: {}", stage, reason);
        self.enter(ImportState::Failed { stage, reason });
    }

    /// 每次呼叫都從 Idle 開始一次完整執行，不保留前次結果
    pub fn process(&mut self) -> Result<Vec<M>> {
        self.state = ImportState::Idle;
        let started = Instant::now();
        let format = self.data_loader.format_name();

        self.enter(ImportState::Loading);
        tracing::debug!("Loading {} source...", format);
        let loaded = match self.data_loader.load() {
            Ok(records) => records,
            Err(e) => {
                self.fail(ImportStage::Loading, e.to_string());
                return Err(e);
            }
        };
        tracing::debug!("Loaded {} records", loaded.len());

        self.enter(ImportState::Validating);
        let validated = match self.validator.validate(loaded) {
            Ok(records) => records,
            Err(e) => {
                self.fail(ImportStage::Validating, e.to_string());
                return Err(e);
            }
        };
        tracing::debug!("Validated {} records", validated.len());

        self.enter(ImportState::Converting);
        let converted = self.converter.convert(validated);

        self.enter(ImportState::Done);
        tracing::info!(
            "✅ Imported {} {} records from {} in {:?}",
            converted.len(),
            M::DOMAIN,
            format,
            started.elapsed()
        );

        Ok(converted)
    }
}
