// 工具函数模块
// 包含输入数据验证等通用工具

pub mod validation;

// 重新导出常用函数
pub use validation::*;
