use ffmpeg_next as ffmpeg;

use super::{Frame, FrameSource};
use crate::discovery::DeviceInfo;
use crate::error::{Error, Result};

/// Live capture from a V4L2 device through libavdevice.
#[derive(Debug, Clone)]
pub struct CameraSource {
    device: DeviceInfo,
    warmup_frames: usize,
}

impl CameraSource {
    pub fn new(device: DeviceInfo, warmup_frames: usize) -> Self {
        Self {
            device,
            warmup_frames,
        }
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    fn frame_to_img_buf(frame: &ffmpeg::util::frame::video::Video) -> Result<image::RgbImage> {
        let width = frame.width();
        let height = frame.height();
        let data = frame.data(0);
        let stride = frame.stride(0);
        let mut buf = Vec::with_capacity((width * height * 3) as usize);

        for y in 0..height {
            let start = y as usize * stride;
            let end = start + (width as usize * 3);
            buf.extend_from_slice(&data[start..end]);
        }

        image::RgbImage::from_raw(width, height, buf)
            .ok_or_else(|| Error::Video("Failed to create RgbImage from raw buffer".into()))
    }
}

impl FrameSource for CameraSource {
    fn grab(&mut self) -> Result<Frame> {
        ffmpeg::init()?;
        ffmpeg::device::register_all();

        let path = &self.device.path;
        log::debug!(
            "Opening camera {} ({}) at {}",
            self.device.index,
            self.device.name,
            path.display()
        );
        let mut ictx = ffmpeg::format::input(path)?;
        let (stream_idx, params) = {
            let stream = ictx
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or_else(|| Error::StreamNotFound(path.clone()))?;
            (stream.index(), stream.parameters())
        };

        let mut decoder = ffmpeg::codec::Context::from_parameters(params)?
            .decoder()
            .video()?;

        let mut to_rgb_scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )?;

        let mut decoded_frames = 0usize;
        let mut decoded = ffmpeg::util::frame::video::Video::empty();
        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_idx {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                decoded_frames += 1;
                if decoded_frames <= self.warmup_frames {
                    continue;
                }
                let mut rgb_frame = ffmpeg::util::frame::video::Video::empty();
                to_rgb_scaler.run(&decoded, &mut rgb_frame)?;
                log::debug!(
                    "Captured {}x{} frame after {} warm-up frames",
                    rgb_frame.width(),
                    rgb_frame.height(),
                    self.warmup_frames
                );
                return Ok(Frame::new(Self::frame_to_img_buf(&rgb_frame)?));
            }
        }

        Err(Error::NoFrameCaptured(path.clone()))
    }

    fn source_id(&self) -> String {
        self.device.index.to_string()
    }
}
