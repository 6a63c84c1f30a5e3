//! 扫码终端的摄像头生命周期。状态机本身不碰账本，只在成功解码时产出一次核销动作，
//! 真正的核销由调用方交给 [`crate::RedemptionEngine`] 完成

use std::time::Duration;

use crate::model::MealType;

/// 一次扫码结束后，终端重新开始扫码前的等待时间
pub const RESCAN_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ScanState {
    Idle,
    Starting,
    Scanning,
    Stopping,
    /// 一次核销后等待重新开始扫码
    CoolingDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Start,
    CameraReady,
    CameraFailed,
    Decoded(String),
    Stopped,
    SelectMeal(MealType),
    Reset,
    /// [`ScanAction::ScheduleRescan`] 设置的计时到期
    CooldownElapsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAction {
    /// 打开摄像头
    OpenCamera,
    /// 关闭摄像头
    CloseCamera,
    Redeem { token: String, meal_type: MealType },
    /// 等待给定时长后投递 [`ScanEvent::CooldownElapsed`]
    ScheduleRescan(Duration),
}

#[derive(Debug)]
pub struct ScanSession {
    state: ScanState,
    meal_type: MealType,
    restart_pending: bool,
    rescan_pending: bool,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self {
            state: ScanState::Idle,
            meal_type: MealType::Breakfast,
            restart_pending: false,
            rescan_pending: false,
        }
    }
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn meal_type(&self) -> MealType {
        self.meal_type
    }

    /// 推进状态机，返回需要执行的动作；当前状态下无意义的事件被忽略
    pub fn handle(&mut self, event: ScanEvent) -> Vec<ScanAction> {
        use ScanState::*;

        let before = self.state;
        let actions = match (self.state, event) {
            (Idle | CoolingDown, ScanEvent::Start) => self.start(),
            (Starting, ScanEvent::CameraReady) => {
                self.state = Scanning;
                Vec::new()
            }
            (Starting, ScanEvent::CameraFailed) => {
                self.state = Idle;
                self.restart_pending = false;
                Vec::new()
            }
            (Scanning, ScanEvent::Decoded(token)) => {
                // 先停相机再核销，同一帧不会被重复提交
                self.state = Stopping;
                self.rescan_pending = true;
                vec![
                    ScanAction::CloseCamera,
                    ScanAction::Redeem {
                        token,
                        meal_type: self.meal_type,
                    },
                ]
            }
            (Stopping, ScanEvent::Stopped) => {
                let rescan = std::mem::take(&mut self.rescan_pending);
                if std::mem::take(&mut self.restart_pending) {
                    self.start()
                } else if rescan {
                    self.state = CoolingDown;
                    vec![ScanAction::ScheduleRescan(RESCAN_COOLDOWN)]
                } else {
                    self.state = Idle;
                    Vec::new()
                }
            }
            (CoolingDown, ScanEvent::CooldownElapsed) => self.start(),
            (state, ScanEvent::SelectMeal(meal_type)) => {
                self.meal_type = meal_type;
                self.restart(state)
            }
            (state, ScanEvent::Reset) => self.restart(state),
            (state, event) => {
                debug!("Ignore scan event {event:?} in state {state}");
                Vec::new()
            }
        };
        if before != self.state {
            debug!("Scan session {before} -> {}", self.state);
        }
        actions
    }

    fn start(&mut self) -> Vec<ScanAction> {
        self.state = ScanState::Starting;
        vec![ScanAction::OpenCamera]
    }

    fn restart(&mut self, state: ScanState) -> Vec<ScanAction> {
        match state {
            ScanState::Idle | ScanState::CoolingDown => self.start(),
            ScanState::Starting | ScanState::Scanning => {
                self.state = ScanState::Stopping;
                self.restart_pending = true;
                vec![ScanAction::CloseCamera]
            }
            // 已经在关闭中，等关闭完成后再启动
            ScanState::Stopping => {
                self.restart_pending = true;
                Vec::new()
            }
        }
    }
}
