pub mod exchangerateapi;
pub mod fallback;
pub mod goldapi;
pub mod islamicapi;
pub mod metalpriceapi;
pub mod provider;
