use crate::domain::model::{DomainModel, Record};
use crate::utils::error::Result;

/// 將來源一次讀成完整的記錄序列；失敗時不回傳部分資料
pub trait DataLoader {
    fn load(&self) -> Result<Vec<Record>>;

    /// 供日誌使用的格式名稱
    fn format_name(&self) -> &'static str;
}

/// 成功時原樣回傳記錄；任一欄位不符即整批失敗
pub trait Validator {
    fn validate(&self, records: Vec<Record>) -> Result<Vec<Record>>;
}

/// 已驗證記錄 -> 領域物件，無 I/O、無錯誤路徑
pub trait Converter {
    type Output: DomainModel;

    fn convert(&self, records: Vec<Record>) -> Vec<Self::Output>;
}

pub trait DataFactory {
    type Model: DomainModel;

    fn create_data_loader(&self) -> Box<dyn DataLoader>;
    fn create_validator(&self) -> Box<dyn Validator>;
    fn create_converter(&self) -> Box<dyn Converter<Output = Self::Model>>;
}
