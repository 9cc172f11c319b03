//! 既定カタログのデータ定義
//!
//! キーパス・値名・値はOS側の仕様なので一字一句変えないこと。

use super::CatalogEntry;
use crate::DomainError;
use crate::model::{
    CommandInvocation, Mutation, OptimizationCategory as Cat, RegistryKey, RegistryMutation,
    RegistryValue, ServiceChange, ServiceStartMode, SubkeyMutation,
};

const TCPIP: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters";
const TCPIP_INTERFACES: &str =
    r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces";
const SYSTEM_PROFILE: &str =
    r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows NT\CurrentVersion\Multimedia\SystemProfile";
const GAMES_TASK: &str = r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows NT\CurrentVersion\Multimedia\SystemProfile\Tasks\Games";
const GRAPHICS_DRIVERS: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\GraphicsDrivers";
const MEMORY_MANAGEMENT: &str =
    r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\Session Manager\Memory Management";
const PREFETCH: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\Session Manager\Memory Management\PrefetchParameters";
const PRIORITY_CONTROL: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\PriorityControl";
const CORE_PARKING: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\Power\PowerSettings\54533251-82be-4824-96c1-47b60b740d00\0cc5b647-c1df-4637-891a-dec35c318583";
const EXECUTIVE: &str =
    r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\Session Manager\Executive";
const KERNEL: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\Session Manager\kernel";
const DISPLAY_CLASS: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\Class\{4d36e968-e325-11ce-bfc1-08002be10318}\0000";
const DIRECTX: &str = r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\DirectX";
const FILE_SYSTEM: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\FileSystem";
const DESKTOP: &str = r"HKEY_CURRENT_USER\Control Panel\Desktop";
const MOUSE: &str = r"HKEY_CURRENT_USER\Control Panel\Mouse";
const ULTIMATE_PERFORMANCE: &str = "e9a42b02-d5df-448d-aa00-03f14749eb61";

/// 変更の定義（静的データ）
enum M {
    DWord(&'static str, &'static str, u32),
    Str(&'static str, &'static str, &'static str),
    /// 親キー直下の各サブキーへのDWORD
    EachDWord(&'static str, &'static str, u32),
    Cmd(&'static str, &'static [&'static str]),
    /// 管理者権限なしで実行できるコマンド
    UserCmd(&'static str, &'static [&'static str]),
    Disable(&'static str),
}

struct Def {
    name: &'static str,
    description: &'static str,
    category: Cat,
    mutations: &'static [M],
}

const DEFS: &[Def] = &[
    // ---------- Network ----------
    Def {
        name: "DisableNagleAlgorithm",
        description: "Send small TCP packets immediately instead of coalescing them",
        category: Cat::Network,
        mutations: &[
            M::EachDWord(TCPIP_INTERFACES, "TcpAckFrequency", 1),
            M::EachDWord(TCPIP_INTERFACES, "TCPNoDelay", 1),
            M::DWord(TCPIP, "TcpDelAckTicks", 0),
        ],
    },
    Def {
        name: "OptimizeTCPSettings",
        description: "Shorten TIME_WAIT and widen the ephemeral port range",
        category: Cat::Network,
        mutations: &[
            M::DWord(TCPIP, "TcpTimedWaitDelay", 30),
            M::DWord(TCPIP, "MaxUserPort", 65534),
            M::DWord(TCPIP, "TcpNumConnections", 16777214),
            M::DWord(TCPIP, "DefaultTTL", 64),
        ],
    },
    Def {
        name: "OptimizeTCPStack",
        description: "Tune retransmission, SACK, window scaling and PMTU discovery",
        category: Cat::Network,
        mutations: &[
            M::DWord(TCPIP, "TcpMaxDataRetransmissions", 3),
            M::DWord(TCPIP, "SackOpts", 1),
            M::DWord(TCPIP, "TcpWindowSize", 65535),
            M::DWord(TCPIP, "Tcp1323Opts", 3),
            M::DWord(TCPIP, "EnablePMTUBHDetect", 0),
            M::DWord(TCPIP, "EnablePMTUDiscovery", 1),
        ],
    },
    Def {
        name: "OptimizeNetworkSettings",
        description: "Disable multimedia network throttling",
        category: Cat::Network,
        mutations: &[M::DWord(SYSTEM_PROFILE, "NetworkThrottlingIndex", 0xFFFF_FFFF)],
    },
    Def {
        name: "TuneTcpGlobalParameters",
        description: "Apply netsh global TCP parameters (autotuning, RSS, CTCP)",
        category: Cat::Network,
        mutations: &[
            M::Cmd("netsh", &["int", "tcp", "set", "global", "autotuninglevel=normal"]),
            M::Cmd("netsh", &["int", "tcp", "set", "global", "chimney=disabled"]),
            M::Cmd("netsh", &["int", "tcp", "set", "global", "rss=enabled"]),
            M::Cmd("netsh", &["int", "tcp", "set", "global", "rsc=disabled"]),
            M::Cmd("netsh", &["int", "tcp", "set", "global", "ecncapability=disabled"]),
            M::Cmd("netsh", &["int", "tcp", "set", "global", "timestamps=disabled"]),
            M::Cmd(
                "netsh",
                &["int", "tcp", "set", "supplemental", "internet", "congestionprovider=ctcp"],
            ),
            M::Cmd("netsh", &["int", "tcp", "set", "heuristics", "disabled"]),
            M::Cmd("netsh", &["int", "tcp", "set", "global", "initialRto=2000"]),
            M::Cmd("netsh", &["int", "tcp", "set", "global", "nonsackrttresiliency=disabled"]),
        ],
    },
    // ---------- Gaming ----------
    Def {
        name: "DisableGameDVR",
        description: "Turn off background game recording",
        category: Cat::Gaming,
        mutations: &[
            M::DWord(r"HKEY_CURRENT_USER\System\GameConfigStore", "GameDVR_Enabled", 0),
            M::DWord(r"HKEY_CURRENT_USER\System\GameConfigStore", "GameDVR_FSEBehaviorMode", 2),
            M::DWord(
                r"HKEY_CURRENT_USER\SOFTWARE\Microsoft\Windows\CurrentVersion\GameDVR",
                "AppCaptureEnabled",
                0,
            ),
            M::DWord(
                r"HKEY_LOCAL_MACHINE\SOFTWARE\Policies\Microsoft\Windows\GameDVR",
                "AllowGameDVR",
                0,
            ),
        ],
    },
    Def {
        name: "EnableGameMode",
        description: "Let Windows prioritise the foreground game",
        category: Cat::Gaming,
        mutations: &[
            M::DWord(r"HKEY_CURRENT_USER\SOFTWARE\Microsoft\GameBar", "AllowAutoGameMode", 1),
            M::DWord(r"HKEY_CURRENT_USER\SOFTWARE\Microsoft\GameBar", "AutoGameModeEnabled", 1),
        ],
    },
    Def {
        name: "PrioritizeGamesTask",
        description: "Raise the MMCSS Games task GPU and scheduling priority",
        category: Cat::Gaming,
        mutations: &[
            M::DWord(GAMES_TASK, "GPU Priority", 8),
            M::DWord(GAMES_TASK, "Priority", 6),
            M::Str(GAMES_TASK, "Scheduling Category", "High"),
            M::Str(GAMES_TASK, "SFIO Priority", "High"),
        ],
    },
    Def {
        name: "MaximizeSystemResponsiveness",
        description: "Reserve no CPU for background multimedia tasks",
        category: Cat::Gaming,
        mutations: &[
            M::DWord(SYSTEM_PROFILE, "SystemResponsiveness", 0),
            M::DWord(SYSTEM_PROFILE, "NoLazyMode", 1),
        ],
    },
    // ---------- GPU ----------
    Def {
        name: "EnableHardwareGPUScheduling",
        description: "Enable hardware-accelerated GPU scheduling",
        category: Cat::Gpu,
        mutations: &[M::DWord(GRAPHICS_DRIVERS, "HwSchMode", 2)],
    },
    Def {
        name: "OptimizeGpuTimeouts",
        description: "Relax GPU timeout detection and recovery",
        category: Cat::Gpu,
        mutations: &[
            M::DWord(GRAPHICS_DRIVERS, "TdrLevel", 0),
            M::DWord(GRAPHICS_DRIVERS, "TdrDelay", 10),
        ],
    },
    Def {
        name: "DisableGpuPreemption",
        description: "Disable GPU scheduler preemption",
        category: Cat::Gpu,
        mutations: &[M::DWord(
            r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\GraphicsDrivers\Scheduler",
            "EnablePreemption",
            0,
        )],
    },
    Def {
        name: "OptimizeDirectX",
        description: "Enable DirectX 12 runtime optimisations",
        category: Cat::Gpu,
        mutations: &[
            M::DWord(
                r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Direct3D",
                "DisableVidMemVirtualization",
                1,
            ),
            M::DWord(DIRECTX, "D3D12_ENABLE_UNSAFE_COMMAND_BUFFER_REUSE", 1),
            M::DWord(DIRECTX, "D3D12_ENABLE_RUNTIME_DRIVER_OPTIMIZATIONS", 1),
        ],
    },
    Def {
        name: "OptimizeNvidiaDriver",
        description: "NVIDIA driver power and DPC tweaks",
        category: Cat::Gpu,
        mutations: &[
            M::DWord(DISPLAY_CLASS, "RMHdcpKeyglobZero", 1),
            M::DWord(DISPLAY_CLASS, "RmGpsPsEnablePerCpuCoreDpc", 1),
            M::DWord(DISPLAY_CLASS, "PowerMizerEnable", 1),
            M::DWord(DISPLAY_CLASS, "PowerMizerLevel", 1),
            M::DWord(DISPLAY_CLASS, "PowerMizerLevelAC", 1),
            M::DWord(DISPLAY_CLASS, "PerfLevelSrc", 0x3322),
            M::DWord(DISPLAY_CLASS, "EnableMSI", 1),
        ],
    },
    Def {
        name: "OptimizeAmdDriver",
        description: "AMD driver DMA and preemption tweaks",
        category: Cat::Gpu,
        mutations: &[
            M::DWord(DISPLAY_CLASS, "DisableDMACopy", 1),
            M::DWord(DISPLAY_CLASS, "DisableBlockWrite", 0),
            M::DWord(DISPLAY_CLASS, "KMD_EnableComputePreemption", 0),
            M::DWord(DISPLAY_CLASS, "KMD_DeLagEnabled", 0),
            M::DWord(DISPLAY_CLASS, "DisableDrmdmaPowerGating", 1),
        ],
    },
    Def {
        name: "OptimizeIntelGraphics",
        description: "Intel iGPU dedicated segment size and overlay tweaks",
        category: Cat::Gpu,
        mutations: &[
            M::DWord(r"HKEY_LOCAL_MACHINE\SOFTWARE\Intel\GMM", "DedicatedSegmentSize", 512),
            M::DWord(GRAPHICS_DRIVERS, "DisableOverlays", 1),
        ],
    },
    Def {
        name: "DisableNvidiaTelemetry",
        description: "Stop and disable the NVIDIA telemetry container",
        category: Cat::Gpu,
        mutations: &[M::Disable("NvTelemetryContainer")],
    },
    Def {
        name: "DisableAmdExternalEvents",
        description: "Stop and disable the AMD External Events Utility",
        category: Cat::Gpu,
        mutations: &[M::Disable("AMD External Events Utility")],
    },
    // ---------- Memory ----------
    Def {
        name: "OptimizeMemoryManagement",
        description: "Keep kernel code resident and disable page combining",
        category: Cat::Memory,
        mutations: &[
            M::DWord(MEMORY_MANAGEMENT, "DisablePagingExecutive", 1),
            M::DWord(MEMORY_MANAGEMENT, "LargeSystemCache", 0),
            M::DWord(MEMORY_MANAGEMENT, "SystemPages", 0),
            M::DWord(MEMORY_MANAGEMENT, "DisablePageCombining", 1),
        ],
    },
    Def {
        name: "DisablePrefetch",
        description: "Disable Prefetcher and Superfetch",
        category: Cat::Memory,
        mutations: &[
            M::DWord(PREFETCH, "EnablePrefetcher", 0),
            M::DWord(PREFETCH, "EnableSuperfetch", 0),
        ],
    },
    Def {
        name: "ProcessIdleTasks",
        description: "Run pending idle maintenance tasks now",
        category: Cat::Memory,
        mutations: &[M::UserCmd("rundll32.exe", &["advapi32.dll,ProcessIdleTasks"])],
    },
    // ---------- CPU ----------
    Def {
        name: "OptimizeCPUScheduling",
        description: "Favour short, variable foreground quanta",
        category: Cat::Cpu,
        mutations: &[M::DWord(PRIORITY_CONTROL, "Win32PrioritySeparation", 38)],
    },
    Def {
        name: "OptimizeInterruptPriority",
        description: "Raise system clock and IRQ16 priority",
        category: Cat::Cpu,
        mutations: &[
            M::DWord(PRIORITY_CONTROL, "IRQ8Priority", 1),
            M::DWord(PRIORITY_CONTROL, "IRQ16Priority", 2),
        ],
    },
    Def {
        name: "DisableCoreParking",
        description: "Keep all CPU cores unparked",
        category: Cat::Cpu,
        mutations: &[
            M::DWord(CORE_PARKING, "ValueMax", 0),
            M::DWord(CORE_PARKING, "ValueMin", 0),
        ],
    },
    Def {
        name: "OptimizeWorkerThreads",
        description: "Add critical and delayed kernel worker threads",
        category: Cat::Cpu,
        mutations: &[
            M::DWord(EXECUTIVE, "AdditionalCriticalWorkerThreads", 2),
            M::DWord(EXECUTIVE, "AdditionalDelayedWorkerThreads", 2),
        ],
    },
    Def {
        name: "DisableCStates",
        description: "Disable processor idle states on the active scheme",
        category: Cat::Cpu,
        mutations: &[M::Cmd(
            "powercfg",
            &[
                "-setacvalueindex",
                "scheme_current",
                "sub_processor",
                "5d76a2ca-e8c0-402f-a133-2158492d58ad",
                "1",
            ],
        )],
    },
    // ---------- Kernel ----------
    Def {
        name: "OptimizeKernelTimers",
        description: "Honour global timer resolution requests",
        category: Cat::Kernel,
        mutations: &[M::DWord(KERNEL, "GlobalTimerResolutionRequests", 1)],
    },
    Def {
        name: "OptimizeDpc",
        description: "Enable threaded DPCs with a shallow queue",
        category: Cat::Kernel,
        mutations: &[
            M::DWord(KERNEL, "ThreadDpcEnable", 1),
            M::DWord(KERNEL, "DpcQueueDepth", 1),
        ],
    },
    Def {
        name: "DisableTsxAutoBan",
        description: "Keep Intel TSX available",
        category: Cat::Kernel,
        mutations: &[M::DWord(KERNEL, "DisableTsxAutoBan", 1)],
    },
    // ---------- Visual ----------
    Def {
        name: "DisableVisualEffects",
        description: "Adjust visual effects for best performance",
        category: Cat::Visual,
        mutations: &[M::DWord(
            r"HKEY_CURRENT_USER\SOFTWARE\Microsoft\Windows\CurrentVersion\Explorer\VisualEffects",
            "VisualFXSetting",
            2,
        )],
    },
    Def {
        name: "ReduceAnimations",
        description: "Disable window animations and menu delay, keep font smoothing",
        category: Cat::Visual,
        mutations: &[
            M::Str(DESKTOP, "MinAnimate", "0"),
            M::Str(DESKTOP, "MenuShowDelay", "0"),
            M::Str(DESKTOP, "FontSmoothing", "2"),
            M::DWord(r"HKEY_CURRENT_USER\Software\Microsoft\Windows\DWM", "EnableAeroPeek", 0),
        ],
    },
    // ---------- Input ----------
    Def {
        name: "DisableMouseAcceleration",
        description: "Turn off enhanced pointer precision",
        category: Cat::Input,
        mutations: &[
            M::Str(MOUSE, "MouseSpeed", "0"),
            M::Str(MOUSE, "MouseThreshold1", "0"),
            M::Str(MOUSE, "MouseThreshold2", "0"),
        ],
    },
    Def {
        name: "OptimizeInputQueues",
        description: "Shrink mouse and keyboard driver queues",
        category: Cat::Input,
        mutations: &[
            M::DWord(
                r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\mouclass\Parameters",
                "MouseDataQueueSize",
                100,
            ),
            M::DWord(
                r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\kbdclass\Parameters",
                "KeyboardDataQueueSize",
                100,
            ),
        ],
    },
    Def {
        name: "OptimizeUsbPolling",
        description: "Poll USB devices every millisecond",
        category: Cat::Input,
        mutations: &[M::DWord(
            r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\usbflags",
            "PollingInterval",
            1,
        )],
    },
    // ---------- Audio ----------
    Def {
        name: "OptimizeAudio",
        description: "Disable protected audio and communications ducking",
        category: Cat::Audio,
        mutations: &[
            M::DWord(
                r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Audio",
                "DisableProtectedAudioDG",
                1,
            ),
            M::DWord(
                r"HKEY_CURRENT_USER\SOFTWARE\Microsoft\Multimedia\Audio",
                "UserDuckingPreference",
                3,
            ),
        ],
    },
    // ---------- Storage ----------
    Def {
        name: "OptimizeNtfs",
        description: "Reserve MFT zone, skip last-access and 8.3 names",
        category: Cat::Storage,
        mutations: &[
            M::DWord(FILE_SYSTEM, "NtfsMftZoneReservation", 2),
            M::DWord(FILE_SYSTEM, "NtfsDisableLastAccessUpdate", 1),
            M::DWord(FILE_SYSTEM, "NtfsDisable8dot3NameCreation", 1),
        ],
    },
    Def {
        name: "OptimizeStorageDrivers",
        description: "NVMe and AHCI driver I/O tweaks",
        category: Cat::Storage,
        mutations: &[
            M::DWord(
                r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\stornvme\Parameters\Device",
                "ForcedPhysicalDiskIo",
                1,
            ),
            M::DWord(
                r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\storahci\Parameters\Device",
                "SingleIO",
                0,
            ),
        ],
    },
    // ---------- Power ----------
    Def {
        name: "UltimatePerformancePlan",
        description: "Create and activate the Ultimate Performance power scheme",
        category: Cat::Power,
        mutations: &[
            M::Cmd("powercfg", &["-duplicatescheme", ULTIMATE_PERFORMANCE]),
            M::Cmd("powercfg", &["/setactive", ULTIMATE_PERFORMANCE]),
        ],
    },
    Def {
        name: "DisableHibernation",
        description: "Turn off hibernation and remove hiberfil.sys",
        category: Cat::Power,
        mutations: &[M::Cmd("powercfg", &["-h", "off"])],
    },
    // ---------- Services ----------
    Def {
        name: "DisableXboxServices",
        description: "Disable Xbox Live and accessory services",
        category: Cat::Services,
        mutations: &[
            M::Disable("XblGameSave"),
            M::Disable("XblAuthManager"),
            M::Disable("XboxGipSvc"),
            M::Disable("XboxNetApiSvc"),
        ],
    },
    Def {
        name: "DisablePrintSpooler",
        description: "Disable the print spooler",
        category: Cat::Services,
        mutations: &[M::Disable("Spooler")],
    },
    Def {
        name: "DisableSysMain",
        description: "Disable SysMain (Superfetch service)",
        category: Cat::Services,
        mutations: &[M::Disable("SysMain")],
    },
    Def {
        name: "DisableTelemetry",
        description: "Disable the connected user experiences and telemetry service",
        category: Cat::Services,
        mutations: &[M::Disable("DiagTrack")],
    },
    Def {
        name: "DisableWindowsSearch",
        description: "Disable the Windows Search indexer",
        category: Cat::Services,
        mutations: &[M::Disable("WSearch")],
    },
    Def {
        name: "DisableTabletInput",
        description: "Disable the touch keyboard and handwriting service",
        category: Cat::Services,
        mutations: &[M::Disable("TabletInputService")],
    },
    Def {
        name: "DisableThemesService",
        description: "Disable the Themes service",
        category: Cat::Services,
        mutations: &[M::Disable("Themes")],
    },
    Def {
        name: "DisableUnneededServices",
        description: "Disable fax, remote registry, maps and media sharing services",
        category: Cat::Services,
        mutations: &[
            M::Disable("Fax"),
            M::Disable("RemoteRegistry"),
            M::Disable("MapsBroker"),
            M::Disable("WMPNetworkSvc"),
            M::Disable("WpnUserService"),
            M::Disable("bthserv"),
        ],
    },
    Def {
        name: "DisableBiometricService",
        description: "Disable the Windows biometric service",
        category: Cat::Services,
        mutations: &[M::Disable("WbioSrvc")],
    },
    Def {
        name: "DisableSmartCardServices",
        description: "Disable smart card services",
        category: Cat::Services,
        mutations: &[
            M::Disable("SCardSvr"),
            M::Disable("ScDeviceEnum"),
            M::Disable("SCPolicySvc"),
        ],
    },
    Def {
        name: "DisableParentalControls",
        description: "Disable the parental controls monitor",
        category: Cat::Services,
        mutations: &[M::Disable("WpcMonSvc")],
    },
    // ---------- Boot (bcdedit) ----------
    Def {
        name: "DisableDynamicTick",
        description: "Disable the dynamic timer tick",
        category: Cat::Boot,
        mutations: &[M::Cmd("bcdedit", &["/set", "disabledynamictick", "yes"])],
    },
    Def {
        name: "UsePlatformTick",
        description: "Use the platform timer tick",
        category: Cat::Boot,
        mutations: &[M::Cmd("bcdedit", &["/set", "useplatformtick", "yes"])],
    },
    Def {
        name: "UsePlatformClock",
        description: "Force the platform clock source",
        category: Cat::Boot,
        mutations: &[M::Cmd("bcdedit", &["/set", "useplatformclock", "yes"])],
    },
    Def {
        name: "UseLegacyApicMode",
        description: "Use legacy APIC mode",
        category: Cat::Boot,
        mutations: &[M::Cmd("bcdedit", &["/set", "uselegacyapicmode", "yes"])],
    },
    Def {
        name: "DisableBootDebug",
        description: "Disable kernel debugging",
        category: Cat::Boot,
        mutations: &[M::Cmd("bcdedit", &["/set", "debug", "no"])],
    },
    Def {
        name: "DisableIntegrityChecks",
        description: "Disable boot integrity checks",
        category: Cat::Boot,
        mutations: &[M::Cmd("bcdedit", &["/set", "nointegritychecks", "yes"])],
    },
    Def {
        name: "EnhancedTscSync",
        description: "Use the enhanced TSC synchronisation policy",
        category: Cat::Boot,
        mutations: &[M::Cmd("bcdedit", &["/set", "tscsyncpolicy", "enhanced"])],
    },
    // ---------- Security ----------
    Def {
        name: "DisableSpectreMitigations",
        description: "Disable speculative execution mitigations",
        category: Cat::Security,
        mutations: &[
            M::DWord(MEMORY_MANAGEMENT, "FeatureSettings", 1),
            M::DWord(MEMORY_MANAGEMENT, "FeatureSettingsOverride", 3),
            M::DWord(MEMORY_MANAGEMENT, "FeatureSettingsOverrideMask", 3),
        ],
    },
    Def {
        name: "DisableVirtualizationBasedSecurity",
        description: "Turn off the hypervisor and VBS",
        category: Cat::Security,
        mutations: &[
            M::Cmd("bcdedit", &["/set", "hypervisorlaunchtype", "off"]),
            M::DWord(
                r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\DeviceGuard",
                "EnableVirtualizationBasedSecurity",
                0,
            ),
        ],
    },
];

/// 静的定義からカタログ項目を構築する
///
/// HKLMへの書き込み・昇格が必要なコマンド・サービス変更を含む項目は管理者権限が必要。
pub(super) fn entries() -> Result<Vec<CatalogEntry>, DomainError> {
    let mut entries = Vec::with_capacity(DEFS.len());
    for def in DEFS {
        let mutations = def
            .mutations
            .iter()
            .map(build_mutation)
            .collect::<Result<Vec<_>, _>>()?;
        let requires_admin = mutations.iter().any(needs_admin);
        entries.push(CatalogEntry::new(
            def.name,
            def.description,
            def.category,
            requires_admin,
            mutations,
        ));
    }
    Ok(entries)
}

fn build_mutation(m: &M) -> Result<Mutation, DomainError> {
    Ok(match m {
        M::DWord(path, name, value) => Mutation::Registry(RegistryMutation {
            key: RegistryKey::new(path, *name)?,
            value: RegistryValue::DWord(*value),
        }),
        M::Str(path, name, value) => Mutation::Registry(RegistryMutation {
            key: RegistryKey::new(path, *name)?,
            value: RegistryValue::String((*value).to_string()),
        }),
        M::EachDWord(parent, name, value) => Mutation::EachSubkey(SubkeyMutation::new(
            parent,
            *name,
            RegistryValue::DWord(*value),
        )?),
        M::Cmd(exe, args) => Mutation::Command(CommandInvocation::new(exe, args)),
        M::UserCmd(exe, args) => {
            let mut cmd = CommandInvocation::new(exe, args);
            cmd.requires_elevation = false;
            Mutation::Command(cmd)
        }
        M::Disable(service) => Mutation::Service(ServiceChange {
            service_name: (*service).to_string(),
            start_mode: ServiceStartMode::Disabled,
        }),
    })
}

fn needs_admin(m: &Mutation) -> bool {
    match m {
        Mutation::Registry(r) => r.key.hive() == crate::model::RegistryHive::LocalMachine,
        Mutation::EachSubkey(m) => m.hive() == crate::model::RegistryHive::LocalMachine,
        Mutation::Command(c) => c.requires_elevation,
        Mutation::Service(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_hive_items_do_not_require_admin() {
        let entries = entries().unwrap();
        let game_mode = entries
            .iter()
            .find(|e| e.item().name == "EnableGameMode")
            .unwrap();
        assert!(!game_mode.item().requires_admin);
        let idle = entries
            .iter()
            .find(|e| e.item().name == "ProcessIdleTasks")
            .unwrap();
        assert!(!idle.item().requires_admin);
        let dvr = entries
            .iter()
            .find(|e| e.item().name == "DisableGameDVR")
            .unwrap();
        assert!(dvr.item().requires_admin);
    }

    #[test]
    fn string_values_keep_their_kind() {
        let entries = entries().unwrap();
        let games = entries
            .iter()
            .find(|e| e.item().name == "PrioritizeGamesTask")
            .unwrap();
        let scheduling = games.mutations().iter().find_map(|m| match m {
            Mutation::Registry(r) if r.key.value_name() == "Scheduling Category" => {
                Some(r.value.clone())
            }
            _ => None,
        });
        assert_eq!(scheduling, Some(RegistryValue::String("High".into())));
    }
}
