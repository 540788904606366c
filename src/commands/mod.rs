// 控制台命令模块
// 包含状态同步、回单同步、批量申请回单与清理命令

pub mod batch_apply;
pub mod cleanup;
pub mod sync_receipts;
pub mod sync_status;
