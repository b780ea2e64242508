use alloy::sol;

sol! {
    interface IPackagePolicy {
        event PackageActivated(
            bytes32 indexed packageKey,
            address owner,
            address beneficiary,
            string manifestUri,
            address[] guardians,
            uint256 guardianQuorum,
            uint256 warnThreshold,
            uint256 inactivityThreshold
        );

        event ManifestUpdated(bytes32 indexed packageKey, string manifestUri);
        event CheckIn(bytes32 indexed packageKey);
        event Renewed(bytes32 indexed packageKey, uint256 paidUntil);

        event GuardianApproved(bytes32 indexed packageKey, address indexed guardian);
        event GuardianVetoed(bytes32 indexed packageKey, address indexed guardian);
        event GuardianVetoRescinded(bytes32 indexed packageKey, address indexed guardian);
        event GuardianApproveRescinded(bytes32 indexed packageKey, address indexed guardian);
        event GuardianStateReset(bytes32 indexed packageKey);

        event PendingRelease(bytes32 indexed packageKey, uint256 reasonFlags);
        event Released(bytes32 indexed packageKey);
        event Revoked(bytes32 indexed packageKey);
        event PackageRescued(bytes32 indexed packageKey);
    }
}
