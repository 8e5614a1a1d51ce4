use linux_embedded_hal::gpio_cdev::Error as GpioError;
use std::io::Error as IoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No button pin configured (unknown PCB revision?)")]
    NoPin,
    #[error("IO error: {0}")]
    Io(#[from] IoError),
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

pub type ButtonResult<T> = Result<T, Error>;
