pub mod device_controller;
