// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! USB CDC transport: a byte stream for the console, and COBS-framed
//! postcard messages for the loader, over the same serial port.

use flashgate_common::protocol::{Command, Response, MAX_FRAME_SIZE};
use heapless::Deque;
use rp2040_hal::usb::UsbBus;
use usb_device::class_prelude::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

const RX_QUEUE_SIZE: usize = 512;
const TX_BUF_SIZE: usize = 32;

pub struct UsbTransport {
    serial: SerialPort<'static, UsbBus>,
    usb_dev: UsbDevice<'static, UsbBus>,
    rx_queue: Deque<u8, RX_QUEUE_SIZE>,
    frame: [u8; MAX_FRAME_SIZE],
    frame_pos: usize,
}

impl UsbTransport {
    pub fn new(usb_bus: &'static UsbBusAllocator<UsbBus>) -> Self {
        let serial = SerialPort::new(usb_bus);
        let usb_dev = UsbDeviceBuilder::new(usb_bus, UsbVidPid(0x2E8A, 0x000A))
            .strings(&[StringDescriptors::default()
                .manufacturer("ADNT")
                .product("flashgate bootloader")
                .serial_number("0001")])
            .unwrap()
            .device_class(usbd_serial::USB_CLASS_CDC)
            .build();

        Self {
            serial,
            usb_dev,
            rx_queue: Deque::new(),
            frame: [0u8; MAX_FRAME_SIZE],
            frame_pos: 0,
        }
    }

    /// Poll USB device and queue received bytes. Must be called frequently.
    pub fn poll(&mut self) -> bool {
        let activity = self.usb_dev.poll(&mut [&mut self.serial]);

        let mut tmp = [0u8; 64];
        if let Ok(count) = self.serial.read(&mut tmp) {
            for &byte in &tmp[..count] {
                if self.rx_queue.push_back(byte).is_err() {
                    break;
                }
            }
        }
        activity
    }

    /// Next received byte, if any.
    pub fn read_byte(&mut self) -> Option<u8> {
        self.poll();
        self.rx_queue.pop_front()
    }

    pub fn peek_byte(&mut self) -> Option<u8> {
        self.poll();
        self.rx_queue.front().copied()
    }

    pub fn has_input(&mut self) -> bool {
        self.poll();
        !self.rx_queue.is_empty()
    }

    /// Drop queued input and any partial frame.
    pub fn discard_input(&mut self) {
        self.poll();
        self.rx_queue.clear();
        self.frame_pos = 0;
    }

    /// Write all of `bytes`, servicing the bus while the endpoint is busy.
    ///
    /// Gives up silently when no terminal holds the port open.
    pub fn write_all(&mut self, bytes: &[u8]) {
        let mut offset = 0;
        while offset < bytes.len() {
            match self.serial.write(&bytes[offset..]) {
                Ok(n) => offset += n,
                Err(UsbError::WouldBlock) => {
                    if !self.serial.dtr() {
                        break;
                    }
                    self.poll();
                }
                Err(_) => break,
            }
        }
    }

    /// Try to receive a complete COBS-framed command.
    ///
    /// Returns `Some(Err(_))` for a complete frame that did not decode.
    pub fn try_receive(&mut self) -> Option<Result<Command, postcard::Error>> {
        self.poll();

        while let Some(byte) = self.rx_queue.pop_front() {
            if byte == 0x00 {
                // COBS delimiter, decode the accumulated frame
                if self.frame_pos > 0 {
                    let result =
                        postcard::from_bytes_cobs::<Command>(&mut self.frame[..self.frame_pos]);
                    self.frame_pos = 0;
                    return Some(result);
                }
            } else if self.frame_pos < MAX_FRAME_SIZE {
                self.frame[self.frame_pos] = byte;
                self.frame_pos += 1;
            } else {
                // Overflow, drop the frame
                self.frame_pos = 0;
            }
        }
        None
    }

    /// Send a response as a COBS-framed postcard message.
    pub fn send(&mut self, resp: &Response) {
        let mut buf = [0u8; TX_BUF_SIZE];
        if let Ok(encoded) = postcard::to_slice_cobs(resp, &mut buf) {
            self.write_all(encoded);
        }
    }
}
