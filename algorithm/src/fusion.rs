use common::{
    channel::ChannelId,
    position::{Fix, FusedFix, FusionOutput},
};

/// Snapshot of the latest fix of every channel in one cycle.
///
/// The snapshot is built by value from the replies of the channel tasks, no
/// channel can modify it once fusion has started.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LatestFixes {
    a: Option<Fix>,
    b: Option<Fix>,
}

impl LatestFixes {
    pub fn new(a: Option<Fix>, b: Option<Fix>) -> Self {
        LatestFixes { a, b }
    }

    pub fn set(&mut self, channel: ChannelId, fix: Option<Fix>) {
        match channel {
            ChannelId::A => self.a = fix,
            ChannelId::B => self.b = fix,
        }
    }

    pub fn get(&self, channel: ChannelId) -> Option<Fix> {
        match channel {
            ChannelId::A => self.a,
            ChannelId::B => self.b,
        }
    }
}

/// Combines the latest fixes of one cycle into a single output.
///
/// Implementations are stateless across cycles from the view of the caller.
/// A filtering or weighting strategy can be substituted here without touching
/// parsing, storage or scheduling.
pub trait FusionPolicy: Send + Sync {
    fn fuse(&self, latest: &LatestFixes) -> FusionOutput;
}

/// Arithmetic mean of both channels, falling back to whichever channel has a fix.
///
/// - Both present: latitude and longitude are the means. The heading is the
///   mean if both report one, otherwise the one that is reported.
/// - One present: that fix verbatim.
/// - None present: [`FusionOutput::NoFix`].
///
/// Headings are averaged arithmetically, 350° and 10° fuse to 180°.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanFusion;

impl FusionPolicy for MeanFusion {
    fn fuse(&self, latest: &LatestFixes) -> FusionOutput {
        match (latest.a, latest.b) {
            (Some(a), Some(b)) => {
                let heading = match (a.heading(), b.heading()) {
                    (Some(ha), Some(hb)) => Some((ha + hb) / 2.0),
                    (ha, hb) => ha.or(hb),
                };
                FusionOutput::Fix(FusedFix {
                    latitude: (a.latitude() + b.latitude()) / 2.0,
                    longitude: (a.longitude() + b.longitude()) / 2.0,
                    heading,
                })
            }
            (Some(fix), None) | (None, Some(fix)) => FusionOutput::Fix(fix.into()),
            (None, None) => FusionOutput::NoFix,
        }
    }
}
