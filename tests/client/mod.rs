// tests/client/mod.rs

// 客户端模块集成测试


mod endpoint_tests;
mod transport_tests;
